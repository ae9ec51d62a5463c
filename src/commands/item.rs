//! Item Command Payloads
//!
//! Request bodies sent with item mutations.

use serde::{Deserialize, Serialize};

use crate::models::ItemId;

// ========================
// Command Argument Structs
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemArgs {
    pub id: ItemId,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItemArgs {
    pub id: ItemId,
}
