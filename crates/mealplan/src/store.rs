use crate::types::{MealPlan, SlotName};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;

const DATE_FMT: &str = "%Y-%m-%d";

/// Keyed-record access to meal plans. One record per (user, date).
#[async_trait]
pub trait MealPlanStore: Send + Sync {
    async fn find_plan(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Option<MealPlan>>;

    /// Apply a slot patch to the day's record, creating it if absent.
    ///
    /// The full current slot map is read, only the patched slots are
    /// replaced, and the complete map is written back, so sibling slots
    /// survive concurrent patches to the same record.
    async fn upsert_slots(
        &self,
        user_id: &str,
        date: NaiveDate,
        patch: &[(SlotName, Vec<String>)],
    ) -> anyhow::Result<MealPlan>;

    /// Plans with `start <= date <= end`, ordered by date.
    async fn plans_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<MealPlan>>;

    async fn delete_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<u64>;

    async fn create_plans(&self, plans: &[MealPlan]) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct SqliteMealPlanStore {
    pool: SqlitePool,
}

impl SqliteMealPlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MealPlanRow {
    id: String,
    user_id: String,
    date: String,
    slots: String,
    note: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

impl MealPlanRow {
    fn into_plan(self) -> anyhow::Result<MealPlan> {
        Ok(MealPlan {
            id: self.id,
            user_id: self.user_id,
            date: NaiveDate::parse_from_str(&self.date, DATE_FMT)?,
            slots: serde_json::from_str(&self.slots)?,
            note: self.note,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

const PLAN_COLUMNS: &str = "id, user_id, date, slots, note, created_at, updated_at";

#[async_trait]
impl MealPlanStore for SqliteMealPlanStore {
    async fn find_plan(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Option<MealPlan>> {
        let sql = format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM meal_plans
            WHERE user_id = ?1 AND date = ?2
            "#
        );

        let row = sqlx::query_as::<_, MealPlanRow>(&sql)
            .bind(user_id)
            .bind(date.format(DATE_FMT).to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(MealPlanRow::into_plan).transpose()
    }

    async fn upsert_slots(
        &self,
        user_id: &str,
        date: NaiveDate,
        patch: &[(SlotName, Vec<String>)],
    ) -> anyhow::Result<MealPlan> {
        let existing = self.find_plan(user_id, date).await?;
        let now = Utc::now();

        match existing {
            Some(mut plan) => {
                for (slot, ids) in patch {
                    plan.slots.set(*slot, ids.clone());
                }
                plan.updated_at = Some(now);

                sqlx::query(
                    r#"
                    UPDATE meal_plans
                    SET slots = ?1, updated_at = ?2
                    WHERE id = ?3
                    "#,
                )
                .bind(serde_json::to_string(&plan.slots)?)
                .bind(now.to_rfc3339())
                .bind(&plan.id)
                .execute(&self.pool)
                .await?;

                Ok(plan)
            }
            None => {
                let mut plan = MealPlan::new(user_id, date);
                for (slot, ids) in patch {
                    plan.slots.set(*slot, ids.clone());
                }

                sqlx::query(
                    r#"
                    INSERT INTO meal_plans (id, user_id, date, slots, note, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
                    "#,
                )
                .bind(&plan.id)
                .bind(&plan.user_id)
                .bind(plan.date.format(DATE_FMT).to_string())
                .bind(serde_json::to_string(&plan.slots)?)
                .bind(&plan.note)
                .bind(plan.created_at.to_rfc3339())
                .execute(&self.pool)
                .await?;

                Ok(plan)
            }
        }
    }

    async fn plans_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<MealPlan>> {
        let sql = format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM meal_plans
            WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date
            "#
        );

        let rows = sqlx::query_as::<_, MealPlanRow>(&sql)
            .bind(user_id)
            .bind(start.format(DATE_FMT).to_string())
            .bind(end.format(DATE_FMT).to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MealPlanRow::into_plan).collect()
    }

    async fn delete_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM meal_plans
            WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
            "#,
        )
        .bind(user_id)
        .bind(start.format(DATE_FMT).to_string())
        .bind(end.format(DATE_FMT).to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn create_plans(&self, plans: &[MealPlan]) -> anyhow::Result<u64> {
        let mut created = 0;

        for plan in plans {
            sqlx::query(
                r#"
                INSERT INTO meal_plans (id, user_id, date, slots, note, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
                "#,
            )
            .bind(&plan.id)
            .bind(&plan.user_id)
            .bind(plan.date.format(DATE_FMT).to_string())
            .bind(serde_json::to_string(&plan.slots)?)
            .bind(&plan.note)
            .bind(plan.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
            created += 1;
        }

        Ok(created)
    }
}
