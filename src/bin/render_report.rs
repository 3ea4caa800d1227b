//! Utility to render a subject's Evolution Report (or one chart) from the command line
//!
//! Usage: render_report <subject_id> [metric]

use std::path::PathBuf;

use fitrack::report::ReportConfig;
use fitrack::tools::reports;

fn get_database_path() -> PathBuf {
    std::env::var("FITRACK_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data").join("fitrack.db"))
}

fn get_output_dir() -> PathBuf {
    std::env::var("FITRACK_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("reports"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("fitrack=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let subject_id: i64 = match args.next() {
        Some(id) => id.parse()?,
        None => {
            eprintln!("Usage: render_report <subject_id> [metric]");
            std::process::exit(2);
        }
    };
    let metric = args.next();

    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());
    let database = fitrack::db::Database::new(&db_path)?;
    database.with_conn(|conn| {
        fitrack::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let config = match std::env::var("FITRACK_REPORT_CONFIG") {
        Ok(path) => ReportConfig::load(&PathBuf::from(path))?,
        Err(_) => ReportConfig::default(),
    };
    let output_dir = get_output_dir();

    let result = match metric {
        Some(metric) => reports::generate_chart_report(&database, &config, &output_dir, subject_id, &metric).await,
        None => reports::generate_evolution_report(&database, &config, &output_dir, subject_id).await,
    }?;

    println!("{}", result.message);
    println!("  File: {}", result.file_path);
    println!("  Assessments: {} ({})", result.assessments, result.date_range);
    println!("  Size: {} bytes", result.bytes);
    Ok(())
}
