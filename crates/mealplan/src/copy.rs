use crate::error::MealPlanError;
use crate::store::MealPlanStore;
use crate::types::MealPlan;
use crate::week::week_of;
use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WeekCopy {
    pub copied: u64,
}

/// Copy every plan in the Monday-start week containing `from` into the week
/// containing `to`, preserving each plan's day offset within the week.
///
/// The destination week is a full overwrite, not a merge: its existing
/// plans are deleted first. A source week with no plans leaves the
/// destination untouched and reports `copied = 0`.
pub async fn copy_week(
    store: &dyn MealPlanStore,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<WeekCopy, MealPlanError> {
    let source = week_of(from);
    let plans = store
        .plans_in_range(user_id, source.start, source.end)
        .await?;

    if plans.is_empty() {
        tracing::debug!(user_id, %from, "source week has no plans, nothing to copy");
        return Ok(WeekCopy { copied: 0 });
    }

    let destination = week_of(to);
    store
        .delete_range(user_id, destination.start, destination.end)
        .await?;

    let moved: Vec<MealPlan> = plans
        .into_iter()
        .map(|plan| {
            let offset = plan.date.signed_duration_since(source.start);
            MealPlan {
                id: Uuid::new_v4().to_string(),
                date: destination.start + offset,
                ..plan
            }
        })
        .collect();

    let copied = store.create_plans(&moved).await?;

    Ok(WeekCopy { copied })
}
