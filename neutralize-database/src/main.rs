use std::process::ExitCode;

use clap::Parser;
use envconfig::Envconfig;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use neutralize_database::config::Config;
use neutralize_database::config_parameter::LICENSE_KEYS;
use neutralize_database::database;
use neutralize_database::native::ModuleScripts;
use neutralize_database::neutralizer::{NeutralizeReport, Neutralizer, Step};

/// Neutralize a copy of an Odoo database so it can be used outside production
#[derive(Parser)]
#[command(name = "neutralize-database", version, about, long_about = None)]
struct Cli {
    /// Name of the database to neutralize
    db_name: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn neutralize_database(db_name: &str) -> Result<NeutralizeReport> {
    let config = Config::init_from_env().wrap_err("failed to load configuration from env")?;

    let mut conn = database::open(&config, db_name).await?;

    let neutralizer = Neutralizer::new(
        ModuleScripts::new(config.addons_paths()),
        config.http_port,
    );
    let result = neutralizer.run_with_progress(&mut conn, print_step).await;

    database::close(conn).await;

    Ok(result?)
}

fn print_step(step: Step) {
    match step {
        Step::RegenerateIdentity => println!("  Regenerating database UUID..."),
        Step::NativeNeutralization => {
            println!("  Running native neutralization...");
            println!("     - Disabling mail servers");
            println!("     - Disabling crons");
            println!("     - Disabling webhooks");
            println!("     - Clearing external API credentials");
        }
        Step::RemoveLicense => println!("  Removing Enterprise license..."),
        Step::FlagDevelopment => println!("  Flagging as development database..."),
        Step::TagCompany => println!("  Updating company name..."),
    }
}

fn print_summary(report: &NeutralizeReport) {
    println!("Database neutralized successfully");
    println!("   - UUID regenerated");
    println!(
        "   - {} license parameters removed ({} present)",
        LICENSE_KEYS.len(),
        report.license_keys_removed
    );
    println!("   - Mail, crons and webhooks disabled");
    println!("   - External API credentials cleared");
    println!(
        "   - {} modules neutralized",
        report.neutralized_modules.len()
    );
    if report.company_renamed {
        println!("   - Company tagged as [DEV]");
    } else {
        println!("   - Company already tagged as [DEV]");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            print!("{}", e);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            print!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    println!("Neutralizing database: {}", cli.db_name);

    match neutralize_database(&cli.db_name)
        .await
        .wrap_err_with(|| format!("failed to neutralize database {}", cli.db_name))
    {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error neutralizing database: {:#}", e);
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
