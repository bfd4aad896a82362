//! Marketplace-facing payloads
//!
//! The scraping/automation side of the agent produces these; the bot only
//! formats and reports them. A `node` is a marketplace chat-thread id, used
//! to build deep links.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Base URL of the marketplace, used for all deep links
pub const MARKET_URL: &str = "https://funpay.com";

/// An inbound marketplace chat message
#[derive(Debug, Clone)]
pub struct IncomingChatMessage {
    /// Sender's marketplace username
    pub author: String,
    /// Message body
    pub text: String,
    /// Time string as shown by the marketplace
    pub time: String,
    /// Chat-thread id
    pub node: String,
}

/// A fully placed order, as seen by the order watcher
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    /// Order id including the leading `#`
    pub id: String,
    pub price: String,
    pub unit: String,
    pub buyer_id: String,
    pub buyer_name: String,
    pub lot_name: String,
}

/// An offer category that was just raised
#[derive(Debug, Clone)]
pub struct RaisedCategory {
    pub name: String,
    pub node_id: String,
}

/// Live account figures rendered on the status screen
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub account: String,
    pub balance: String,
    pub sales: String,
    pub last_update: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Fresh snapshot at process start, before the first scrape completes
    #[must_use]
    pub fn starting_now() -> Self {
        let now = Utc::now();
        Self {
            account: "—".to_string(),
            balance: "—".to_string(),
            sales: "—".to_string(),
            last_update: now,
            started_at: now,
        }
    }
}

/// Snapshot handle shared between the scraper side and the status screen
#[derive(Clone)]
pub struct SharedSnapshot(pub Arc<RwLock<MarketSnapshot>>);

impl SharedSnapshot {
    #[must_use]
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self(Arc::new(RwLock::new(snapshot)))
    }

    pub async fn read(&self) -> MarketSnapshot {
        self.0.read().await.clone()
    }
}
