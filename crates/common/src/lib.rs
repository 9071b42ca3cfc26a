pub mod collab;
pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

pub use collab::{BarFeed, Journal, Notifier};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use types::*;
