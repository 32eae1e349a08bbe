pub mod loader;
pub mod schema;

pub use loader::{ConfigError, load_config};
pub use schema::{Config, LlmConfig};
