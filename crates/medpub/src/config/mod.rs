pub mod loader;
pub mod schema;

pub use loader::{apply_env_overrides, load_config, load_config_from_str, AUTH_TOKEN_ENV_VAR};
pub use schema::{
    Config, LoggingConfig, PublishConfig, RecoveryConfig, ServerConfig, WebhooksConfig,
    DEFAULT_PUBLISH_BASE_URL,
};
