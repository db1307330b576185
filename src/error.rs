use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] floodroute_core::Error),
    #[error("Cannot read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("Invalid TOML configuration: {0}")]
    ConfigToml(#[from] toml::de::Error),
}
