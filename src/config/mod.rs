//! Service configuration loaded from `config.toml`.

mod defaults;
mod errors;
mod io;
mod types;

pub use errors::ConfigError;
pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save_to_path};
pub use types::{
    BlobSettings, LoggingSettings, NotifySettings, QueueSettings, ResourceSettings,
    RetrySettings, ServiceConfig, StoreSettings, TrainerSettings,
};
