//! mealcal command line

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mealcal::build_info::BuildInfo;
use mealcal::calendar::{build_month_matrix, strip_time, CalendarDate, MonthMatrix};
use mealcal::config::Settings;
use mealcal::db::{self, Database, SqliteMealStore};
use mealcal::nutrition::get_nutrition_range;

#[derive(Parser, Debug)]
#[command(name = "mealcal")]
#[command(about = "Meal log calendar grids and date-range nutrition totals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Print the month grid for a month (defaults to the current month)
    Calendar {
        /// Month as yyyy-mm
        #[arg(value_parser = parse_month)]
        month: Option<CalendarDate>,
    },
    /// Print per-day nutrition totals for a user as JSON
    Range {
        /// User identifier
        user_id: String,
        /// First day, yyyy-mm-dd
        #[arg(value_parser = parse_day)]
        start: CalendarDate,
        /// Last day, yyyy-mm-dd
        #[arg(value_parser = parse_day)]
        end: CalendarDate,
    },
}

fn parse_day(s: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse_iso(s).map_err(|e| format!("expected yyyy-mm-dd: {}", e))
}

fn parse_month(s: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse_iso(&format!("{}-01", s.trim()))
        .map_err(|e| format!("expected yyyy-mm: {}", e))
}

fn open_database(settings: &Settings) -> Result<Database, Box<dyn std::error::Error>> {
    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %settings.database_path.display(), "Opening database");

    let database = Database::new(&settings.database_path)?;
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        info!(version, "Database schema ready");
        Ok(())
    })?;
    Ok(database)
}

fn print_matrix(matrix: &MonthMatrix) {
    println!("{:04}-{:02}", matrix.year, matrix.month);
    println!("Su Mo Tu We Th Fr Sa");
    for week in matrix.weeks() {
        let cells: Vec<String> = week
            .days()
            .iter()
            .map(|d| {
                if matrix.is_in_month(*d) {
                    format!("{:>2}", d.day())
                } else {
                    " .".to_string()
                }
            })
            .collect();
        println!("{}", cells.join(" "));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mealcal=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;
    info!("{}", BuildInfo::current().banner());

    match cli.command {
        Commands::Migrate => {
            open_database(&settings)?;
        }
        Commands::Calendar { month } => {
            let cursor = month
                .unwrap_or_else(|| strip_time(&Utc::now().with_timezone(&settings.utc_offset)));
            print_matrix(&build_month_matrix(&cursor));
        }
        Commands::Range { user_id, start, end } => {
            let offset = settings.utc_offset;
            let start = start.start_in(&offset);
            let end = end.start_in(&offset);

            let store = SqliteMealStore::new(open_database(&settings)?);
            let stats = get_nutrition_range(&store, &user_id, &start, &end).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
