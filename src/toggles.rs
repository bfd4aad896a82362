//! Operational toggles and their single-writer manager
//!
//! Six independent booleans gate the bot's background behaviors and
//! notification categories. The canonical copy lives in the persisted
//! settings document; [`ToggleManager`] holds an in-memory mirror that is
//! replaced with the canonical merge result after every write. All writes go
//! through the manager, nothing else mutates the settings document.

use crate::storage::{Store, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The six persisted operational booleans
///
/// Serialized field names match the pre-existing settings document
/// vocabulary, so a data directory written by earlier deployments keeps
/// working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggles {
    /// Keep the marketplace session looking online
    #[serde(rename = "alwaysOnline")]
    pub always_online: bool,
    /// Periodically raise the shop's offers
    #[serde(rename = "lotsRaise")]
    pub auto_raise: bool,
    /// Alert on orders paid outside auto-issue
    #[serde(rename = "newOrderNonAutoNotification")]
    pub order_notify: bool,
    /// Alert on new marketplace chat messages
    #[serde(rename = "newMessageNotification")]
    pub message_notify: bool,
    /// Alert when offers get raised
    #[serde(rename = "lotsRaiseNotification")]
    pub raise_notify: bool,
    /// Alert when a product is auto-issued
    #[serde(rename = "deliveryNotification")]
    pub delivery_notify: bool,
}

impl Toggles {
    /// All six toggles set to the same value
    #[must_use]
    pub const fn uniform(enable: bool) -> Self {
        Self {
            always_online: enable,
            auto_raise: enable,
            order_notify: enable,
            message_notify: enable,
            raise_notify: enable,
            delivery_notify: enable,
        }
    }
}

/// Names of the individual toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    AlwaysOnline,
    AutoRaise,
    OrderNotify,
    MessageNotify,
    RaiseNotify,
    DeliveryNotify,
}

impl Toggle {
    /// Resolve a persisted key to a toggle; `None` for unknown keys, which
    /// callers must treat as a no-op
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "alwaysOnline" => Some(Self::AlwaysOnline),
            "lotsRaise" => Some(Self::AutoRaise),
            "newOrderNonAutoNotification" => Some(Self::OrderNotify),
            "newMessageNotification" => Some(Self::MessageNotify),
            "lotsRaiseNotification" => Some(Self::RaiseNotify),
            "deliveryNotification" => Some(Self::DeliveryNotify),
            _ => None,
        }
    }

    /// Display name used in toggle confirmation replies
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AlwaysOnline => "🟢 Всегда онлайн",
            Self::AutoRaise => "⬆️ Автоподнятие предложений",
            Self::OrderNotify => "📦 Уведомления о новых заказах (не автовыдача)",
            Self::MessageNotify => "✉️ Уведомления о новых сообщениях",
            Self::RaiseNotify => "⬆️ Уведомления о поднятиях",
            Self::DeliveryNotify => "🚚 Уведомления о выдаче товара",
        }
    }

    /// Read this toggle's value
    #[must_use]
    pub const fn get(self, toggles: &Toggles) -> bool {
        match self {
            Self::AlwaysOnline => toggles.always_online,
            Self::AutoRaise => toggles.auto_raise,
            Self::OrderNotify => toggles.order_notify,
            Self::MessageNotify => toggles.message_notify,
            Self::RaiseNotify => toggles.raise_notify,
            Self::DeliveryNotify => toggles.delivery_notify,
        }
    }

    fn flip(self, toggles: &mut Toggles) {
        match self {
            Self::AlwaysOnline => toggles.always_online = !toggles.always_online,
            Self::AutoRaise => toggles.auto_raise = !toggles.auto_raise,
            Self::OrderNotify => toggles.order_notify = !toggles.order_notify,
            Self::MessageNotify => toggles.message_notify = !toggles.message_notify,
            Self::RaiseNotify => toggles.raise_notify = !toggles.raise_notify,
            Self::DeliveryNotify => toggles.delivery_notify = !toggles.delivery_notify,
        }
    }
}

/// Serialized writer for the settings document with a cached mirror
pub struct ToggleManager {
    store: Arc<dyn Store>,
    // The mutex is the single-writer discipline for the settings resource:
    // every read-modify-write cycle holds it from mirror read to mirror
    // replacement.
    mirror: Mutex<Toggles>,
}

impl ToggleManager {
    /// Build the manager, seeding the mirror from the persisted document
    ///
    /// # Errors
    ///
    /// Returns an error if the settings document cannot be read.
    pub async fn load(store: Arc<dyn Store>) -> Result<Self, StorageError> {
        let current = store.read_settings().await?;
        Ok(Self {
            store,
            mirror: Mutex::new(current),
        })
    }

    /// Snapshot of the cached toggles
    pub async fn current(&self) -> Toggles {
        *self.mirror.lock().await
    }

    /// Flip one toggle, persist the full object, return the new value
    ///
    /// # Errors
    ///
    /// Returns an error if the merge-and-persist write fails; the mirror is
    /// left unchanged in that case.
    pub async fn toggle(&self, toggle: Toggle) -> Result<bool, StorageError> {
        let mut mirror = self.mirror.lock().await;

        let mut patch = *mirror;
        toggle.flip(&mut patch);

        let canonical = self.store.load_settings(patch).await?;
        *mirror = canonical;

        let value = toggle.get(&canonical);
        info!("toggle {:?} -> {}", toggle, value);
        Ok(value)
    }

    /// Set all six toggles to the same value in one persisted write
    ///
    /// # Errors
    ///
    /// Returns an error if the merge-and-persist write fails.
    pub async fn toggle_all(&self, enable: bool) -> Result<(), StorageError> {
        let mut mirror = self.mirror.lock().await;
        let canonical = self.store.load_settings(Toggles::uniform(enable)).await?;
        *mirror = canonical;
        info!("all toggles -> {}", enable);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStore;

    fn manager_with(store: MockStore, initial: Toggles) -> ToggleManager {
        ToggleManager {
            store: Arc::new(store),
            mirror: Mutex::new(initial),
        }
    }

    #[tokio::test]
    async fn toggle_persists_full_object_and_echoes_new_value() {
        let mut store = MockStore::new();
        store
            .expect_load_settings()
            .withf(|patch| patch.always_online && !patch.auto_raise)
            .times(1)
            .returning(|patch| Ok(patch));

        let manager = manager_with(store, Toggles::default());
        let value = manager.toggle(Toggle::AlwaysOnline).await.expect("toggle");
        assert!(value);
        assert!(manager.current().await.always_online);
    }

    #[tokio::test]
    async fn double_toggle_restores_value_with_two_persisted_writes() {
        let mut store = MockStore::new();
        store
            .expect_load_settings()
            .times(2)
            .returning(|patch| Ok(patch));

        let manager = manager_with(store, Toggles::default());
        assert!(manager.toggle(Toggle::MessageNotify).await.expect("first"));
        assert!(!manager.toggle(Toggle::MessageNotify).await.expect("second"));
        assert_eq!(manager.current().await, Toggles::default());
    }

    #[tokio::test]
    async fn toggle_all_is_one_write() {
        let mut store = MockStore::new();
        store
            .expect_load_settings()
            .withf(|patch| *patch == Toggles::uniform(true))
            .times(1)
            .returning(|patch| Ok(patch));

        let manager = manager_with(store, Toggles::default());
        manager.toggle_all(true).await.expect("enable all");
        assert_eq!(manager.current().await, Toggles::uniform(true));
    }

    #[test]
    fn unknown_key_resolves_to_none() {
        assert_eq!(Toggle::from_key("autoIssue"), None);
        assert_eq!(Toggle::from_key(""), None);
        assert_eq!(Toggle::from_key("alwaysOnline"), Some(Toggle::AlwaysOnline));
    }

    #[test]
    fn persisted_keys_use_legacy_vocabulary() {
        let json = serde_json::to_value(Toggles::uniform(true)).expect("serialize");
        assert_eq!(json["alwaysOnline"], serde_json::json!(true));
        assert_eq!(json["lotsRaise"], serde_json::json!(true));
        assert_eq!(json["newOrderNonAutoNotification"], serde_json::json!(true));
    }
}
