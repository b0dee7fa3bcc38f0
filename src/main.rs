//! Hospital management system.
//!
//! Console entry point: load configuration, open the database, then
//! either run a one-shot administrative subcommand or drop into the
//! login menu.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hms::config;
use hms::help::HelpData;
use hms::{menu, HospitalDb};

#[derive(Parser)]
#[command(name = "hms", about = "Hospital management system")]
struct Cli {
    /// Override HMS_DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Register a console user without entering the menu.
    RegisterUser {
        username: String,
        password: String,
        /// One of: admin, doctor, staff.
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config();
    let database_url = cli.database_url.unwrap_or(config.database_url);
    let db = HospitalDb::connect(&database_url).await?;

    match cli.command {
        Some(Command::RegisterUser {
            username,
            password,
            role,
        }) => {
            db.register_user(&username, &password, &role).await?;
            println!("User {username:?} registered with role {role:?}.");
        }
        None => {
            let help = HelpData::load(&config.help_file);
            menu::run(&db, &help).await?;
        }
    }
    Ok(())
}
