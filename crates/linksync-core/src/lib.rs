pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ingest;
pub mod inbox;
pub mod models;
pub mod notify;
pub mod secure_storage;
pub mod store;

pub use api::{ApiClient, ApiResponse, OutboundSender};
pub use auth::{AuthMirror, AuthService, IdentityProvider, SessionStatus, SessionTokens};
pub use config::CoreConfig;
pub use error::CoreError;
pub use inbox::{ActionHandler, ActionOutcome, InboxView};
pub use ingest::IngestListener;
pub use models::{classify, InboxItem, ItemKind};
pub use store::{InboxStore, SharedStorage};
