use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedpubError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] crate::webhook::WebhookError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] crate::proxy::ProxyError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] crate::workflow::WorkflowError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid webhook URL for '{endpoint}': {reason}")]
    InvalidUrl { endpoint: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove object '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object path '{0}'")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, MedpubError>;
