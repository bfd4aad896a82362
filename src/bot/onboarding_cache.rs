//! Onboarding-reply flood protection
//!
//! Unauthenticated senders get one onboarding reply per cooldown window,
//! not one per message. Repeating the reply on every message would let a
//! stranger drive the bot into Telegram rate limiting. Silenced attempts
//! are still counted and logged with throttling.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const MAX_TRACKED_CHATS: u64 = 10_000;

pub struct OnboardingCache {
    // Entry presence means "replied recently"; the TTL is the cooldown.
    cache: Cache<i64, ()>,
    silenced: AtomicU64,
}

impl OnboardingCache {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_TRACKED_CHATS)
                .time_to_live(cooldown)
                .build(),
            silenced: AtomicU64::new(0),
        }
    }

    /// Whether this chat should get the onboarding reply now
    pub async fn should_send(&self, chat_id: i64) -> bool {
        if self.cache.get(&chat_id).await.is_none() {
            return true;
        }

        let count = self.silenced.fetch_add(1, Ordering::Relaxed) + 1;
        if count % 100 == 0 {
            tracing::debug!("silenced {count} onboarding replies (recent chat: {chat_id})");
        }
        false
    }

    /// Start the cooldown window after a successful reply
    pub async fn mark_sent(&self, chat_id: i64) {
        self.cache.insert(chat_id, ()).await;
    }

    /// Total silenced attempts so far
    #[must_use]
    pub fn silenced_count(&self) -> u64 {
        self.silenced.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_contact_gets_a_reply() {
        let cache = OnboardingCache::new(Duration::from_secs(60));
        assert!(cache.should_send(1).await);
    }

    #[tokio::test]
    async fn repeat_contact_is_silenced_within_cooldown() {
        let cache = OnboardingCache::new(Duration::from_secs(60));
        assert!(cache.should_send(1).await);
        cache.mark_sent(1).await;

        assert!(!cache.should_send(1).await);
        assert_eq!(cache.silenced_count(), 1);

        // Other chats are unaffected.
        assert!(cache.should_send(2).await);
    }
}
