use anyhow::Result;
use clap::Parser;

use incident_analysis::config::AppConfig;
use incident_analysis::seed::SeedOutcome;

#[derive(Parser)]
#[command(
    name = "incident-analysis",
    about = "Seed a synthetic security incident store and write an analysis report",
    version,
    long_about = None
)]
struct Cli {
    /// Incidents to generate when the store is empty (default 120)
    #[arg(long)]
    rows: Option<usize>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::default();
    let rows = cli.rows.unwrap_or(config.default_rows);

    println!("Starting incident analysis");
    let summary = incident_analysis::run(&config, rows)?;

    match summary.seed {
        SeedOutcome::Seeded { rows } => println!("Seeded {} synthetic incidents", rows),
        SeedOutcome::AlreadySeeded { existing } => {
            println!("Store already holds {} incidents, skipped seeding", existing)
        }
    }

    println!("✅ Done!");
    println!("Database: {}", config.db_path.display());
    println!("Report:   {}", config.report_path.display());
    println!("\nQuick summary:");
    println!("Total incidents: {}", summary.result.total);
    let severities: Vec<String> = summary
        .result
        .by_severity
        .iter()
        .map(|g| format!("{}:{}", g.key, g.count))
        .collect();
    println!("Top severities: {}", severities.join(", "));

    Ok(())
}
