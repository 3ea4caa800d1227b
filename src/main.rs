//! Fitness Assessment Tracker (fitrack)
//!
//! An MCP server for body assessments and evolution reports.

use std::path::PathBuf;
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use fitrack::build_info;
use fitrack::db;
use fitrack::mcp::FitrackService;
use fitrack::report::ReportConfig;

/// Project root when running from target/release or target/debug, else the exe dir
fn project_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }
    path
}

/// Get the database path from environment or use default
fn get_database_path() -> PathBuf {
    std::env::var("FITRACK_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| project_dir().join("data").join("fitrack.db"))
}

/// Get the report output directory from environment or use default
fn get_output_dir() -> PathBuf {
    std::env::var("FITRACK_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| project_dir().join("reports"))
}

fn get_report_config() -> Result<ReportConfig, Box<dyn std::error::Error>> {
    match std::env::var("FITRACK_REPORT_CONFIG") {
        Ok(path) => {
            eprintln!("Report config: {}", path);
            Ok(ReportConfig::load(&PathBuf::from(path))?)
        }
        Err(_) => Ok(ReportConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging goes to stderr; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fitrack=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = get_database_path();
    eprintln!("Database path: {}", db_path.display());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let output_dir = get_output_dir();
    eprintln!("Report output: {}", output_dir.display());
    let report_config = get_report_config()?;

    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let service = FitrackService::new(db_path, database, report_config, output_dir);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
