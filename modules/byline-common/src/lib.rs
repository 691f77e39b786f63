pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, RunSettings};
pub use error::{ConfigError, FetchError, PublishError, RenderError, VerifyError};
pub use types::*;
