//! Wizard state for the operator dialogue
//!
//! Exactly one state is active at any instant; the transient wizard payload
//! lives inside the variant, so stale combinations of "waiting" flags cannot
//! exist. Menu commands always preempt a pending state — that precedence is
//! encoded by branch order in the dispatch tree.

use crate::catalog::LotType;
use serde::{Deserialize, Serialize};

/// Current step of the operator's data-entry flow
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum State {
    /// No wizard in progress
    #[default]
    Idle,
    /// Add-product wizard: waiting for the lot name
    AwaitingLotName { lot_type: LotType },
    /// Add-product wizard: waiting for the lot content. For `Accounts` lots
    /// this state is re-entrant: each message lands in `pending_nodes` until
    /// the back command finalizes the product.
    AwaitingLotContent {
        lot_type: LotType,
        name: String,
        pending_nodes: Vec<String>,
    },
    /// Remove-product wizard: waiting for the 1-based index
    AwaitingLotDelete,
    /// Import wizard: waiting for the catalog document upload
    AwaitingDeliveryFile,
}
