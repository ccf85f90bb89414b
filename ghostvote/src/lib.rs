mod config;

pub use config::{ChainConfig, ChainConfigBuilder, Config, ConfigError, WalletConfig};
