use angi::app::AppState;
use angi::config::Config;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions};

use angi_mealplan::{MealPlanError, SlotTarget, copy_week};
use angi_menu::{MealSuggestionOptions, MenuOptions};
use angi_pricing::refresh_scheduler;

/// angi - what to eat today
#[derive(Parser)]
#[command(name = "angi")]
#[command(about = "Meal planning and priced shopping lists for Vietnamese home cooking", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Drop database if exists and recreate with migrations
    Reset,
    /// Re-verify every ingredient price once, now
    RefreshPrices,
    /// Run the daily price-refresh scheduler until interrupted
    Scheduler,
    /// Compose a menu for a date and optionally write it into the plan
    SuggestMenu {
        #[arg(long)]
        user: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Target slot: all, breakfast, lunch or dinner
        #[arg(long, default_value = "all")]
        slot: String,
        #[arg(long)]
        starter: bool,
        #[arg(long)]
        dessert: bool,
        /// Budget over the summed cook time of the menu, in minutes
        #[arg(long)]
        max_cook_minutes: Option<u32>,
        #[arg(long)]
        region: Option<String>,
        /// Seed for deterministic composition
        #[arg(long)]
        seed: Option<u64>,
        /// Write the composed menu into the meal plan
        #[arg(long)]
        persist: bool,
    },
    /// Flat preference-driven dish suggestions
    SuggestMeals {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Priced shopping list from planned meals or an explicit recipe list
    ShoppingList {
        #[arg(long)]
        user: Option<String>,
        /// Range start (YYYY-MM-DD), with --user
        #[arg(long)]
        start: Option<String>,
        /// Range end (YYYY-MM-DD), with --user
        #[arg(long)]
        end: Option<String>,
        /// Explicit recipe ids, alternative to a date range
        #[arg(long = "recipe")]
        recipes: Vec<String>,
    },
    /// Show one day's plan with resolved dish titles
    ShowPlan {
        #[arg(long)]
        user: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Copy one planned week onto another (destination is overwritten)
    CopyWeek {
        #[arg(long)]
        user: String,
        /// Any date inside the source week (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Any date inside the destination week (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    angi::observability::init_tracing(&config.observability.log_level)?;

    match cli.command {
        Commands::Migrate => migrate_command(config).await,
        Commands::Reset => reset_command(config).await,
        Commands::RefreshPrices => refresh_prices_command(config).await,
        Commands::Scheduler => scheduler_command(config).await,
        Commands::SuggestMenu {
            user,
            date,
            slot,
            starter,
            dessert,
            max_cook_minutes,
            region,
            seed,
            persist,
        } => {
            let options = MenuOptions {
                include_starter: starter,
                include_dessert: dessert,
                max_total_cook_minutes: max_cook_minutes,
                region,
                pool_limit: config.menu.pool_limit,
                persist,
            };
            suggest_menu_command(config, user, date, slot, options, seed).await
        }
        Commands::SuggestMeals { user, limit } => {
            suggest_meals_command(config, user, limit).await
        }
        Commands::ShoppingList {
            user,
            start,
            end,
            recipes,
        } => shopping_list_command(config, user, start, end, recipes).await,
        Commands::ShowPlan { user, date } => show_plan_command(config, user, date).await,
        Commands::CopyWeek { user, from, to } => copy_week_command(config, user, from, to).await,
    }
}

async fn connect(config: &Config) -> Result<sqlx::SqlitePool> {
    Ok(SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?)
}

fn parse_date(raw: &str) -> Result<NaiveDate, MealPlanError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| MealPlanError::InvalidDate(format!("{raw}: {e}")))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tracing::instrument(skip(config))]
async fn migrate_command(config: Config) -> Result<()> {
    tracing::info!("Running database migrations...");

    if !sqlx::Sqlite::database_exists(&config.database.url).await? {
        tracing::info!("Database does not exist, creating: {}", config.database.url);
        sqlx::Sqlite::create_database(&config.database.url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Migrations completed successfully");

    Ok(())
}

#[tracing::instrument(skip(config))]
async fn reset_command(config: Config) -> Result<()> {
    tracing::info!("Resetting database...");

    if sqlx::Sqlite::database_exists(&config.database.url).await? {
        tracing::warn!("Dropping existing database: {}", config.database.url);
        sqlx::Sqlite::drop_database(&config.database.url).await?;
    } else {
        tracing::info!("Database does not exist, nothing to drop");
    }

    migrate_command(config).await
}

async fn refresh_prices_command(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let report = state.refresher.refresh_all().await?;

    print_json(&report)
}

async fn scheduler_command(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let mut sched = refresh_scheduler(state.refresher.clone(), &config.pricing.refresh_cron)
        .await
        .map_err(|e| anyhow::anyhow!("failed to build scheduler: {e}"))?;
    sched
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start scheduler: {e}"))?;

    tracing::info!(cron = %config.pricing.refresh_cron, "price refresh scheduler started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down scheduler");

    sched
        .shutdown()
        .await
        .map_err(|e| anyhow::anyhow!("failed to stop scheduler: {e}"))?;

    Ok(())
}

async fn suggest_menu_command(
    config: Config,
    user: String,
    date: String,
    slot: String,
    options: MenuOptions,
    seed: Option<u64>,
) -> Result<()> {
    let date = parse_date(&date)?;
    let target: SlotTarget = slot.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let suggestion = state
        .composer
        .suggest_menu(&user, date, target, &options, &mut rng)
        .await?;

    print_json(&suggestion)
}

async fn suggest_meals_command(config: Config, user: String, limit: usize) -> Result<()> {
    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let suggestion = state
        .composer
        .suggest_meals(&user, &MealSuggestionOptions { limit })
        .await?;

    print_json(&suggestion)
}

async fn shopping_list_command(
    config: Config,
    user: Option<String>,
    start: Option<String>,
    end: Option<String>,
    recipes: Vec<String>,
) -> Result<()> {
    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let list = if !recipes.is_empty() {
        state.shopping.for_recipes(&recipes).await?
    } else {
        let (Some(user), Some(start), Some(end)) = (user, start, end) else {
            anyhow::bail!("provide either --recipe ids or --user with --start and --end");
        };
        state
            .shopping
            .for_date_range(&user, parse_date(&start)?, parse_date(&end)?)
            .await?
    };

    print_json(&list)
}

async fn show_plan_command(config: Config, user: String, date: String) -> Result<()> {
    let date = parse_date(&date)?;

    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let plan = state
        .plans
        .find_plan(&user, date)
        .await?
        .ok_or_else(|| MealPlanError::NotFound {
            user_id: user.clone(),
            date: date.to_string(),
        })?;

    let mut dishes = serde_json::Map::new();
    for id in plan.slots.all_recipe_ids() {
        if let Some(recipe) = state.catalog.find_by_id(&id).await? {
            dishes.insert(id, serde_json::Value::String(recipe.title));
        }
    }

    print_json(&serde_json::json!({ "plan": plan, "dishes": dishes }))
}

async fn copy_week_command(config: Config, user: String, from: String, to: String) -> Result<()> {
    let from = parse_date(&from)?;
    let to = parse_date(&to)?;

    let pool = connect(&config).await?;
    let state = AppState::new(&config, pool)?;

    let result = copy_week(state.plans.as_ref(), &user, from, to).await?;

    print_json(&result)
}
