use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::{self, Write};
use worldstat::application::engine::{CountryEngine, DeleteOutcome, RefreshFailure};
use worldstat::config::Settings;
use worldstat::domain::country::{CountryQuery, SortOrder};
use worldstat::error::WorldstatError;
use worldstat::interfaces::csv::country_writer::CountryWriter;
use worldstat::logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch both feeds and rebuild the country snapshot
    Refresh,
    /// List stored countries
    List {
        /// Only countries in this region (exact match)
        #[arg(long)]
        region: Option<String>,
        /// Only countries whose primary currency has this code (exact match)
        #[arg(long)]
        currency: Option<String>,
        /// name, gdp_desc or gdp_asc
        #[arg(long, default_value = "name")]
        sort: SortOrder,
        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },
    /// Show one country, matched case-insensitively
    Show { name: String },
    /// Delete one country, matched case-insensitively
    Delete { name: String },
    /// Record count and last refresh time
    Status,
    /// Print the path of the summary image
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.settings.log_format);

    let engine = cli.settings.build_engine().into_diagnostic()?;
    run(&engine, cli.command).await
}

async fn run(engine: &CountryEngine, command: Command) -> Result<()> {
    match command {
        Command::Refresh => match engine.refresh().await {
            Ok(report) => {
                // The process exits right after, so let the image land first
                engine.wait_for_summary().await;
                print_json(&report)
            }
            Err(err) => {
                if let Some(failure) = RefreshFailure::from_error(&err) {
                    print_json(&failure)?;
                }
                Err(err).into_diagnostic()
            }
        },
        Command::List {
            region,
            currency,
            sort,
            csv,
        } => {
            let query = CountryQuery {
                region,
                currency_code: currency,
                sort,
            };
            let countries = engine.countries(&query).await.into_diagnostic()?;
            if csv {
                let stdout = io::stdout();
                let mut writer = CountryWriter::new(stdout.lock());
                writer.write_countries(&countries).into_diagnostic()
            } else {
                print_json(&countries)
            }
        }
        Command::Show { name } => match engine.country(&name).await.into_diagnostic()? {
            Some(country) => print_json(&country),
            None => Err(WorldstatError::NotFound(name)).into_diagnostic(),
        },
        Command::Delete { name } => match engine.delete_country(&name).await.into_diagnostic()? {
            DeleteOutcome::Deleted(deleted) => print_json(&serde_json::json!({ "deleted": deleted })),
            DeleteOutcome::NotFound => Err(WorldstatError::NotFound(name)).into_diagnostic(),
        },
        Command::Status => print_json(&engine.status().await.into_diagnostic()?),
        Command::Summary => match engine.summary_image().await {
            Some(path) => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", path.display()).into_diagnostic()
            }
            None => Err(miette::miette!(
                "Summary image not found; run `worldstat refresh` first"
            )),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).into_diagnostic()?;
    writeln!(stdout).into_diagnostic()
}
