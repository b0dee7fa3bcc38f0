//! Hospital management core library.
//!
//! CRUD over the clinical schema plus the bed-allocation and
//! appointment-lifecycle workflows, backed by SQLite. The console menus
//! in `menu` are one caller; the library API stands on its own.

pub mod auth;
pub mod error;
pub mod help;
pub mod menu;
pub mod models;
pub mod store;
pub mod workflow;

pub use error::{HospitalError, Result};
pub use store::HospitalDb;

/// Application configuration
pub mod config {
    use std::env;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub struct Config {
        pub database_url: String,
        pub help_file: PathBuf,
    }

    /// Load configuration from the environment (a `.env` file is read by
    /// the binary before this runs).
    pub fn load_config() -> Config {
        Config {
            database_url: env::var("HMS_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://hms.db".into()),
            help_file: env::var("HMS_HELP_FILE")
                .unwrap_or_else(|_| "help.json".into())
                .into(),
        }
    }
}
