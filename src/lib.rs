//! Telegram control panel for a marketplace-automation agent
//!
//! One authorized operator manages the auto-issue catalog and operational
//! toggles through a button-menu dialogue; marketplace events (orders,
//! messages, raises, deliveries) come back as formatted alerts.

/// Telegram session controller
pub mod bot;
/// Auto-issue catalog model and persistence
pub mod catalog;
/// Process configuration
pub mod config;
/// Marketplace-facing payloads
pub mod market;
/// Notification dispatcher
pub mod notify;
/// File-backed storage collaborator
pub mod storage;
/// Operational toggles
pub mod toggles;
/// Formatting helpers
pub mod utils;
