//! Notification dispatcher
//!
//! Classifies marketplace events and sends formatted HTML alerts to the
//! captured operator chat. Every category is gated by its own toggle, and
//! every send requires the operator identity; when it is missing the call
//! logs a reminder and returns, it never fails the triggering flow. Send
//! failures are logged and swallowed for the same reason.

use crate::market::{IncomingChatMessage, PlacedOrder, RaisedCategory, MARKET_URL};
use crate::storage::Store;
use crate::toggles::ToggleManager;
use lazy_regex::{lazy_regex, Lazy};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{error, warn};

/// Marketplace payment-confirmation phrasing. Messages matching this are
/// order receipts, not operator conversation.
static RE_ORDER_PAID: Lazy<regex::Regex> = lazy_regex!(r"^Покупатель .+ оплатил заказ");

/// Order id as it appears in receipts: `#` plus up to eight chars
static RE_ORDER_ID: Lazy<regex::Regex> = lazy_regex!(r"#([A-Z0-9]{1,8})");

fn esc(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Returns true when a chat message is an order-payment receipt
#[must_use]
pub fn is_payment_confirmation(text: &str) -> bool {
    RE_ORDER_PAID.is_match(text)
}

/// Order reference pulled out of a payment receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRef {
    /// Id without the leading `#`
    pub id: String,
    /// Lot name, taken from the rest of the receipt's first line
    pub lot_name: String,
}

/// Extract the order id and lot name from a receipt body
#[must_use]
pub fn parse_order_ref(text: &str) -> Option<OrderRef> {
    let first_line = text.lines().next()?;
    let m = RE_ORDER_ID.find(first_line)?;
    let lot_name = first_line[m.end()..]
        .trim_start_matches(['.', ',', ' '])
        .trim_end_matches('.')
        .to_string();
    Some(OrderRef {
        id: first_line[m.start() + 1..m.end()].to_string(),
        lot_name,
    })
}

/// Chat-message alert body
#[must_use]
pub fn format_chat_message(msg: &IncomingChatMessage) -> String {
    format!(
        "💬 <b>Новое сообщение</b> от пользователя <b><i>{}</i></b>.\n\n{}\n\n\
         <i>{}</i> | <a href=\"{MARKET_URL}/chat/?node={}\">Перейти в чат</a>",
        esc(&msg.author),
        esc(&msg.text),
        esc(&msg.time),
        msg.node,
    )
}

/// Non-auto new-order alert body, built from a payment receipt
#[must_use]
pub fn format_order_from_chat(msg: &IncomingChatMessage, order: &OrderRef) -> String {
    format!(
        "✔️ <b>Новый заказ</b> <a href=\"{MARKET_URL}/orders/{id}\">#{id}</a>.\n\n\
         👤 <b>Покупатель:</b> <a href=\"{MARKET_URL}/chat/?node={node}\"><b>{author}</b></a>\n\
         🛍️ <b>Товар:</b> <code>{lot}</code>\n\
         <i>{time}</i> | <a href=\"{MARKET_URL}/chat/?node={node}\">Перейти в чат</a>",
        id = order.id,
        node = msg.node,
        author = esc(&msg.author),
        lot = esc(&order.lot_name),
        time = esc(&msg.time),
    )
}

/// Full new-order alert body (order watcher path)
#[must_use]
pub fn format_new_order(order: &PlacedOrder) -> String {
    format!(
        "✔️ <b>Новый заказ</b> <a href=\"{MARKET_URL}/orders/{}/\">{}</a> \
         на сумму <b><i>{} {}</i></b>.\n\n\
         👤 <b>Покупатель:</b> <a href=\"{MARKET_URL}/users/{}/\">{}</a>\n\
         🛍️ <b>Товар:</b> <code>{}</code>",
        order.id.trim_start_matches('#'),
        esc(&order.id),
        esc(&order.price),
        esc(&order.unit),
        order.buyer_id,
        esc(&order.buyer_name),
        esc(&order.lot_name),
    )
}

/// Offers-raised alert body
#[must_use]
pub fn format_lots_raised(category: &RaisedCategory, next_time: &str) -> String {
    format!(
        "⬆️ Предложения в категории <a href=\"{MARKET_URL}/lots/{}/trade\">{}</a> подняты.\n\
         ⌚ Следующее поднятие: <b><i>{}</i></b>",
        category.node_id,
        esc(&category.name),
        esc(next_time),
    )
}

/// Delivery alert body
#[must_use]
pub fn format_delivery(buyer_name: &str, lot_name: &str, message: &str) -> String {
    format!(
        "📦 Товар <code>{}</code> выдан покупателю <b><i>{}</i></b> с сообщением:\n\n{}",
        esc(lot_name),
        esc(buyer_name),
        esc(message),
    )
}

/// Outbound alert sender, gated by toggles and the operator identity
pub struct Notifier {
    bot: Bot,
    store: Arc<dyn Store>,
    toggles: Arc<ToggleManager>,
}

impl Notifier {
    #[must_use]
    pub fn new(bot: Bot, store: Arc<dyn Store>, toggles: Arc<ToggleManager>) -> Self {
        Self {
            bot,
            store,
            toggles,
        }
    }

    /// The captured operator chat, if any. Absence is not an error: the
    /// operator just has not contacted the bot yet.
    async fn operator_chat(&self) -> Option<ChatId> {
        match self.store.get_const("chatId").await {
            Ok(Some(value)) => value.as_i64().map(ChatId),
            Ok(None) => {
                warn!("no operator chat captured yet; write to the bot in Telegram to receive notifications");
                None
            }
            Err(e) => {
                error!("failed to read operator chat id: {e}");
                None
            }
        }
    }

    async fn send(&self, body: String) {
        let Some(chat_id) = self.operator_chat().await else {
            return;
        };
        if let Err(e) = crate::bot::messaging::send_html(&self.bot, chat_id, &body, None).await {
            error!("failed to send notification: {e}");
        }
    }

    /// Route an inbound marketplace chat message
    ///
    /// Payment receipts become non-auto order alerts, gated solely by the
    /// order toggle; everything else is a chat-message alert gated by the
    /// message toggle.
    pub async fn on_chat_message(&self, msg: IncomingChatMessage) {
        let toggles = self.toggles.current().await;

        if is_payment_confirmation(&msg.text) {
            if !toggles.order_notify {
                return;
            }
            match parse_order_ref(&msg.text) {
                Some(order) => self.send(format_order_from_chat(&msg, &order)).await,
                None => warn!("payment receipt without an order id: {}", msg.text),
            }
            return;
        }

        if !toggles.message_notify {
            return;
        }
        self.send(format_chat_message(&msg)).await;
    }

    /// Alert for a fully placed order
    pub async fn on_new_order(&self, order: PlacedOrder) {
        if !self.toggles.current().await.order_notify {
            return;
        }
        self.send(format_new_order(&order)).await;
    }

    /// Alert for a raised offer category
    pub async fn on_lots_raised(&self, category: RaisedCategory, next_time: String) {
        if !self.toggles.current().await.raise_notify {
            return;
        }
        self.send(format_lots_raised(&category, &next_time)).await;
    }

    /// Alert for an auto-issued product
    pub async fn on_delivery(&self, buyer_name: String, lot_name: String, message: String) {
        if !self.toggles.current().await.delivery_notify {
            return;
        }
        self.send(format_delivery(&buyer_name, &lot_name, &message))
            .await;
    }
}
