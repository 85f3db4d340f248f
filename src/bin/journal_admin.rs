use clap::{Parser, Subcommand};

use tradejournal::db::{self, trade_repo, user_repo};

/// Maintenance commands for the trade journal database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the most recent trades as JSON.
    Print {
        /// How many trades to print.
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Delete trades, either every trade or one user's.
    Clear {
        /// Only clear trades owned by this account.
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = db::init_pool(&url).await?;
    db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Print { limit } => {
            let trades = trade_repo::get_recent_trades(&pool, limit).await?;
            println!("{}", serde_json::to_string_pretty(&trades)?);
            println!("Rows: {}", trade_repo::count_trades(&pool).await?);
        }
        Commands::Clear { email } => {
            let deleted = match email {
                Some(email) => {
                    let user = user_repo::get_user_by_email(&pool, &email)
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("no user with email {email}"))?;
                    trade_repo::delete_all_for_user(&pool, user.id).await?
                }
                None => trade_repo::delete_all(&pool).await?,
            };
            println!("Deleted {deleted} trades.");
            println!("Remaining: {}", trade_repo::count_trades(&pool).await?);
        }
    }

    Ok(())
}
