pub mod broadcast;
pub mod case;
pub mod composer;
pub mod config;
pub mod db;
pub mod error;
pub mod proxy;
pub mod repository;
pub mod sanitize;
pub mod secrets;
pub mod session;
pub mod storage;
pub mod webhook;
pub mod workflow;

pub use broadcast::{CaseEvent, CaseEventBroadcaster};
pub use case::{AnalysisCase, CasePatch, CaseStatus, DemoCase, Modality, NewCase};
pub use composer::{compose_markup, insert_into_template, ArticleDocument, SectionKind, TemplateKey};
pub use config::{apply_env_overrides, load_config, Config};
pub use db::{case_repo::CaseFilter, Database, DatabaseError};
pub use error::{ConfigError, MedpubError, Result, StorageError};
pub use proxy::{CaseProxy, Proxy, ProxyError};
pub use repository::CaseRepository;
pub use secrets::{resolve_secret, SecretError};
pub use session::Session;
pub use storage::{FsObjectStore, ObjectStore};
pub use webhook::{HttpWebhookClient, Webhook, WebhookEndpoint, WebhookError};
pub use workflow::{Workflow, WorkflowError};
