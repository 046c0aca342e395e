use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::{load_config, load_config_from, Config, DatabaseSettings};
use consolidation::Consolidator;
use core_types::{Competency, Organization, RawMetricsRecord, ResultRecord};
use database::{connect, run_migrations, DbRepository, InMemoryStore, KpiStore};
use serde_json::Value;
use std::path::{Path, PathBuf};

mod logging;
mod render;

/// The main entry point for the hospital KPI consolidation tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; settings may come from elsewhere.
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let _log_guard = logging::init(&config.logging)?;

    // Execute the appropriate command
    if let Err(e) = dispatch(cli.command, &config).await {
        tracing::error!(error = ?e, "Command failed.");
        return Err(e);
    }
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Computes and consolidates monthly hospital quality indicators.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of ./config.toml.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate raw metric rows from a JSON file entirely in memory and print the results.
    Compute(ComputeArgs),
    #[command(flatten)]
    Stored(StoredCommand),
}

/// Commands that run against the configured database.
#[derive(Subcommand)]
enum StoredCommand {
    /// Validate raw metric rows from a JSON file and store them for consolidation.
    Submit(InputArgs),
    /// Consolidate one submitted month.
    Consolidate(CompetencyArgs),
    /// Recompute and reapply the variation flags of a consolidated month.
    RefreshVariation(CompetencyArgs),
    /// Show which months of a year were submitted and consolidated.
    History(HistoryArgs),
    /// Show the most recently consolidated month of an organization.
    Last(OrganizationArgs),
    /// Register an organization, or update its name and active flag.
    RegisterOrganization(RegisterArgs),
    /// List active organizations.
    Organizations,
}

#[derive(Args)]
struct InputArgs {
    /// A JSON file holding one raw metrics object or an array of them.
    #[arg(long)]
    input: PathBuf,
}

#[derive(Args)]
struct ComputeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print the result documents as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Include the stratification of every indicator in the tables.
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct CompetencyArgs {
    #[arg(long)]
    org: i64,
    #[arg(long)]
    year: i32,
    /// Month number, 1 to 12.
    #[arg(long)]
    month: u32,
}

impl CompetencyArgs {
    fn competency(&self) -> anyhow::Result<Competency> {
        Ok(Competency::new(self.org, self.year, self.month)?)
    }
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(long)]
    org: i64,
    #[arg(long)]
    year: i32,
}

#[derive(Args)]
struct OrganizationArgs {
    #[arg(long)]
    org: i64,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    org: i64,
    #[arg(long)]
    name: String,
    /// Register the organization as inactive.
    #[arg(long)]
    inactive: bool,
}

impl RegisterArgs {
    fn organization(&self) -> Organization {
        Organization {
            organization_id: self.org,
            name: self.name.clone(),
            active: !self.inactive,
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn dispatch(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Compute(args) => handle_compute(args).await,
        Commands::Stored(command) => {
            let store = open_store(&config.database).await?;
            handle_stored(command, &store).await
        }
    }
}

async fn open_store(settings: &DatabaseSettings) -> anyhow::Result<DbRepository> {
    let pool = connect(settings).await.context("Failed to connect to the database")?;
    if settings.run_migrations {
        run_migrations(&pool).await.context("Failed to run database migrations")?;
    }
    Ok(DbRepository::new(pool))
}

/// Runs submit and consolidate for every row of the file against a throwaway
/// in-memory store, oldest month first, so consecutive rows get variation flags.
async fn handle_compute(args: ComputeArgs) -> anyhow::Result<()> {
    let rows = read_rows(&args.input.input)?;
    let store = InMemoryStore::new();
    let consolidator = Consolidator::new(&store);

    let mut competencies = Vec::with_capacity(rows.len());
    for raw in &rows {
        competencies.push(consolidator.submit(raw).await?);
    }
    competencies.sort();
    competencies.dedup();

    let mut results: Vec<ResultRecord> = Vec::with_capacity(competencies.len());
    for competency in competencies {
        let outcome = consolidator.run(competency).await?;
        tracing::info!(%competency, "{}", render::outcome_summary(&outcome));
        if let Some(record) = store.fetch_result(competency).await? {
            results.push(record);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for record in &results {
            println!("{}", record.competency());
            println!("{}", render::result_table(record, args.detailed));
        }
    }
    Ok(())
}

async fn handle_stored<S: KpiStore + ?Sized>(command: StoredCommand, store: &S) -> anyhow::Result<()> {
    let consolidator = Consolidator::new(store);

    match command {
        StoredCommand::Submit(args) => {
            for raw in read_rows(&args.input)? {
                let competency = consolidator.submit(&raw).await?;
                println!("Submitted {competency}.");
            }
        }
        StoredCommand::Consolidate(args) => {
            let competency = args.competency()?;
            let outcome = consolidator.run(competency).await?;
            println!("Consolidated {competency}. {}", render::outcome_summary(&outcome));
            if let Some(table) = render::failed_items_table(&outcome) {
                println!("{table}");
            }
            if let Some(record) = store.fetch_result(competency).await? {
                println!("{}", render::result_table(&record, false));
            }
        }
        StoredCommand::RefreshVariation(args) => {
            let competency = args.competency()?;
            let outcome = consolidator.refresh_variation(competency).await?;
            println!("Refreshed {competency}. {}", render::outcome_summary(&outcome));
            if let Some(table) = render::failed_items_table(&outcome) {
                println!("{table}");
            }
        }
        StoredCommand::History(args) => {
            let history = consolidator.history(args.org, args.year).await?;
            println!(
                "Organization {}, {}: {} submitted, {} consolidated",
                history.organization_id,
                history.year,
                history.submitted_count(),
                history.consolidated_count()
            );
            println!("{}", render::history_table(&history));
        }
        StoredCommand::Last(args) => match consolidator.last_consolidation(args.org).await? {
            Some(competency) => println!("Last consolidated: {competency}"),
            None => println!("Organization {} has no consolidated month yet.", args.org),
        },
        StoredCommand::RegisterOrganization(args) => {
            let organization = args.organization();
            store.upsert_organization(&organization).await?;
            println!(
                "Registered organization {} ({}).",
                organization.organization_id, organization.name
            );
        }
        StoredCommand::Organizations => {
            let organizations = store.active_organizations().await?;
            println!("{}", render::organizations_table(&organizations));
        }
    }
    Ok(())
}

/// Reads one raw metrics object, or an array of them, from a JSON file.
fn read_rows(path: &Path) -> anyhow::Result<Vec<RawMetricsRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let rows = match value {
        Value::Array(items) => items
            .into_iter()
            .map(RawMetricsRecord::from_value)
            .collect::<Result<Vec<_>, _>>()?,
        other => vec![RawMetricsRecord::from_value(other)?],
    };
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compute_runs_offline_and_the_rest_need_a_store() {
        let cli = Cli::try_parse_from(["hospital-kpi", "compute", "--input", "rows.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Compute(_)));

        let cli = Cli::try_parse_from(["hospital-kpi", "last", "--org", "1001"]).unwrap();
        assert!(matches!(cli.command, Commands::Stored(StoredCommand::Last(_))));
    }

    #[test]
    fn test_register_organization_arguments() {
        let cli = Cli::try_parse_from([
            "hospital-kpi",
            "register-organization",
            "--org",
            "1001",
            "--name",
            "Hospital Norte",
            "--inactive",
        ])
        .unwrap();

        match cli.command {
            Commands::Stored(StoredCommand::RegisterOrganization(args)) => {
                let organization = args.organization();
                assert_eq!(organization.organization_id, 1001);
                assert_eq!(organization.name, "Hospital Norte");
                assert!(!organization.active);
            }
            _ => panic!("expected register-organization"),
        }
    }
}
