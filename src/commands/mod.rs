//! Backend Commands
//!
//! Interface to the backing service, organized by concern:
//! - item: request payloads
//! - subscription: the cancellable creation feed
//! - memory: in-process reference backend

mod item;
mod memory;
mod subscription;

use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::models::Item;

pub use item::*;
pub use memory::{BackendOp, InMemoryBackend};
pub use subscription::{ChannelSource, CreationEvent, CreationSource, Subscription};

/// Backing service consumed by the client
///
/// All operations are async; the client never blocks on them.
#[async_trait]
pub trait TodoBackend: Send + Sync {
    /// Fetch the full list
    async fn list_items(&self) -> ServiceResult<Vec<Item>>;

    /// Persist a newly created item
    async fn create_item(&self, item: &Item) -> ServiceResult<()>;

    /// Persist a new `completed` value
    async fn update_item(&self, args: UpdateItemArgs) -> ServiceResult<()>;

    /// Delete an item by id
    async fn delete_item(&self, args: DeleteItemArgs) -> ServiceResult<()>;

    /// Open the live feed of item creations
    async fn subscribe_creations(&self) -> ServiceResult<Subscription>;
}
