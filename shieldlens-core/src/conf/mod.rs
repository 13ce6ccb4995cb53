mod error;
mod loader;
pub mod types;
mod validate;

pub use error::ConfigError;
pub use loader::{CONFIG_FILE_NAME, load_config};
pub use types::ShieldlensConfig;
pub use validate::validate;
