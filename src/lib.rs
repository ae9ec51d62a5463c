//! Shared To-Do Client
//!
//! Client-side reconciliation engine for a shared to-do list:
//! - identity: per-session client tag
//! - models: items and the draft form
//! - store: pure `(state, action) -> state` list store
//! - counter: cached completed-items count
//! - executor: optimistic create/delete/toggle with fire-and-forget confirmation
//! - feed: merging of remote creation events
//! - commands: backend interface, subscription, in-memory backend
//! - app: session orchestration and event loop
//! - config: client settings

pub mod app;
pub mod commands;
pub mod config;
pub mod counter;
pub mod error;
pub mod executor;
pub mod feed;
pub mod identity;
pub mod models;
pub mod store;


pub use app::{Intent, TodoApp};
pub use commands::{CreationEvent, InMemoryBackend, Subscription, TodoBackend};
pub use config::{ClientConfig, ConfigError};
pub use counter::CompletedCounter;
pub use error::{ServiceError, ServiceResult, ValidationError};
pub use executor::{Confirmation, MutationExecutor, Outcome};
pub use feed::FeedListener;
pub use identity::ClientId;
pub use models::{Draft, DraftField, Item, ItemId};
pub use store::{Action, ListState, Store};
