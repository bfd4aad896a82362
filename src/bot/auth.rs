//! Authorization guard
//!
//! The bot serves exactly one operator, identified by Telegram username.
//! The first authorized contact also captures the operator's chat id — the
//! destination for all outbound notifications. Capture is idempotent:
//! once the constant is persisted it is never rewritten.

use crate::storage::Store;
use serde_json::json;
use std::sync::Arc;
use teloxide::types::{ChatId, Message};
use tracing::{error, info};

pub struct AuthGuard {
    owner_username: String,
    store: Arc<dyn Store>,
}

impl AuthGuard {
    #[must_use]
    pub fn new(owner_username: String, store: Arc<dyn Store>) -> Self {
        Self {
            owner_username,
            store,
        }
    }

    /// Check a message against the configured owner and capture the chat id
    /// on first success
    pub async fn authenticate(&self, msg: &Message) -> bool {
        let Some(username) = msg.from.as_ref().and_then(|u| u.username.as_deref()) else {
            return false;
        };
        if username != self.owner_username {
            return false;
        }

        self.capture_identity(msg.chat.id).await;
        true
    }

    /// Persist the operator chat id if it has not been captured yet
    async fn capture_identity(&self, chat_id: ChatId) {
        match self.store.get_const("chatId").await {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(e) = self.store.set_const("chatId", json!(chat_id.0)).await {
                    error!("failed to persist operator chat id: {e}");
                } else {
                    info!("captured operator chat id {chat_id}");
                }
            }
            Err(e) => error!("failed to read operator chat id: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use serde_json::Value;

    async fn guard_with_temp_store() -> (AuthGuard, Arc<FileStorage>) {
        let dir = std::env::temp_dir().join(format!("lotkeeper-test-{}", uuid::Uuid::new_v4()));
        let store = Arc::new(
            FileStorage::new(dir.join("configs/settings.json"), dir.join("consts.json"))
                .await
                .expect("create storage"),
        );
        (
            AuthGuard::new("seller".to_string(), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn identity_capture_is_idempotent() {
        let (guard, store) = guard_with_temp_store().await;

        guard.capture_identity(ChatId(111)).await;
        assert_eq!(
            store.get_const("chatId").await.expect("get"),
            Some(Value::from(111))
        );

        // A later contact from another chat must not move the identity.
        guard.capture_identity(ChatId(222)).await;
        assert_eq!(
            store.get_const("chatId").await.expect("get"),
            Some(Value::from(111))
        );
    }
}
