use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Tick unavailable for {0}")]
    TickUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
