//! Optimistic Mutation Executor
//!
//! Applies create/delete/toggle to the store immediately, then confirms each
//! one against the backend in an independent task. A failed confirmation is
//! logged and nothing else: local state is never rolled back.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::commands::{DeleteItemArgs, TodoBackend, UpdateItemArgs};
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::identity::ClientId;
use crate::models::{Item, ItemId};
use crate::store::{Action, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    fn past_tense(&self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// How a remote confirmation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Failed(ServiceError),
}

impl Outcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed)
    }
}

/// Handle to an in-flight confirmation
///
/// Dropping it detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct Confirmation {
    operation: Operation,
    item_id: ItemId,
    handle: JoinHandle<Outcome>,
}

impl Confirmation {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Wait for the backend's answer. Never used on the interactive path.
    pub async fn settled(self) -> Outcome {
        self.handle
            .await
            .unwrap_or_else(|e| Outcome::Failed(ServiceError::Internal(e.to_string())))
    }
}

/// Executes user intents optimistically
///
/// Must be used from within a tokio runtime: confirmations are spawned tasks.
#[derive(Clone)]
pub struct MutationExecutor {
    client_id: ClientId,
    backend: Arc<dyn TodoBackend>,
}

impl MutationExecutor {
    pub fn new(client_id: ClientId, backend: Arc<dyn TodoBackend>) -> Self {
        Self { client_id, backend }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Create an item from the current draft
    ///
    /// Validation happens before anything changes. On success the item is
    /// prepended and the draft reset before the backend is contacted.
    pub fn create(&self, store: &mut Store) -> Result<Confirmation, ValidationError> {
        let draft = &store.state().draft;
        draft.validate()?;

        let item = Item::new(self.client_id, draft.name.clone(), draft.description.clone());
        let id = item.id;
        store.dispatch(Action::Prepend { item: item.clone() });
        store.dispatch(Action::ResetForm);

        let backend = Arc::clone(&self.backend);
        Ok(confirm(Operation::Create, id, async move {
            backend.create_item(&item).await
        }))
    }

    /// Remove locally, then request deletion. Removing an absent id is a no-op.
    pub fn delete(&self, store: &mut Store, id: ItemId) -> Confirmation {
        store.dispatch(Action::Remove { id });

        let backend = Arc::clone(&self.backend);
        confirm(Operation::Delete, id, async move {
            backend.delete_item(DeleteItemArgs { id }).await
        })
    }

    /// Flip `completed` (and the counter) locally, then persist the new value
    ///
    /// Returns `None` when the item is not in the store.
    pub fn toggle_complete(&self, store: &mut Store, id: ItemId) -> Option<Confirmation> {
        let Some(completed) = store.state().find(id).map(|item| !item.completed) else {
            log::debug!("toggle ignored, item {} not in list", id);
            return None;
        };
        store.dispatch(Action::ToggleCompleted { id });

        let backend = Arc::clone(&self.backend);
        Some(confirm(Operation::Update, id, async move {
            backend.update_item(UpdateItemArgs { id, completed }).await
        }))
    }
}

fn confirm<F>(operation: Operation, item_id: ItemId, request: F) -> Confirmation
where
    F: Future<Output = ServiceResult<()>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        match request.await {
            Ok(()) => {
                log::info!("successfully {} item {}", operation.past_tense(), item_id);
                Outcome::Confirmed
            }
            Err(e) => {
                log::error!("failed to {} item {}: {}", operation, item_id, e);
                Outcome::Failed(e)
            }
        }
    });

    Confirmation {
        operation,
        item_id,
        handle,
    }
}
