use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use subtrack::components::notifier::ConsoleNotifier;
use subtrack::components::CalendarAction;
use subtrack::error::other_error;
use subtrack::startup;
use subtrack::subscription::{load_subscriptions, Subscription};
use tracing::info;

#[derive(Parser)]
#[command(name = "subtrack", version, about = "Push subscription renewals to Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add one subscription's renewal to the calendar
    Add {
        #[arg(long)]
        name: String,
        /// Display price, e.g. "$15.99"
        #[arg(long)]
        price: String,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        renewal_date: String,
    },
    /// Add every subscription listed in a TOML or JSON file
    Import { path: PathBuf },
    /// Show whether a valid access token is cached
    Token,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    let cli = Cli::parse();

    // Load configuration
    let config = startup::load_config()?;

    match cli.command {
        Command::Add {
            name,
            price,
            renewal_date,
        } => {
            let integration = startup::build_integration(&config, Arc::new(ConsoleNotifier))?;
            let action = CalendarAction::new(Arc::new(integration));
            action
                .trigger(&Subscription::new(name, price, renewal_date))
                .await?;
        }
        Command::Import { path } => {
            let subscriptions = load_subscriptions(&path)?;
            info!(
                "Adding {} subscriptions from {}",
                subscriptions.len(),
                path.display()
            );

            let integration = startup::build_integration(&config, Arc::new(ConsoleNotifier))?;
            let mut failed = 0;
            for subscription in &subscriptions {
                // Failures are already reported to the user; keep going
                if integration.add_to_calendar(subscription).await.is_err() {
                    failed += 1;
                }
            }

            if failed > 0 {
                return Err(other_error(&format!(
                    "{} of {} subscriptions could not be added",
                    failed,
                    subscriptions.len()
                ))
                .into());
            }
        }
        Command::Token => {
            println!("{}", startup::token_status(&config).await?);
        }
    }

    Ok(())
}
