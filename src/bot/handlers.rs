//! Session controller endpoints
//!
//! Routing order lives in `main`: authorization first, then the fixed menu
//! vocabulary, then whichever wizard state is pending, then the home-menu
//! fallback. Handlers here only do the work; any error they return is caught
//! by [`report_unhandled`], which informs the operator and resets the wizard
//! so the session can never get stuck waiting for input that will never
//! satisfy a stale state.

use super::keyboards;
use super::messaging::{send_html, send_plain};
use super::state::State;
use crate::catalog::{
    finalize_accounts, parse_catalog_document, parse_delete_index, CatalogStore, DeleteIndexError,
    LotType, Product,
};
use crate::config::{Settings, CATALOG_FILE_NAME};
use crate::market::SharedSnapshot;
use crate::toggles::{Toggle, ToggleManager};
use crate::utils;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use tracing::{error, info, warn};

/// Wizard dialogue handle
pub type BotDialogue = Dialogue<State, InMemStorage<State>>;

const MENU_TEXT: &str = "🏠 Меню";
const SAVED_TEXT: &str = "Окей, сохранил товар.";

const fn on_off(value: bool) -> &'static str {
    if value {
        "Вкл"
    } else {
        "Выкл"
    }
}

/// Top-level failure path: log, tell the operator, reset the wizard
pub async fn report_unhandled(bot: &Bot, chat_id: ChatId, dialogue: &BotDialogue, err: &anyhow::Error) {
    error!("error while handling operator message: {err:#}");
    if let Err(e) = dialogue.update(State::Idle).await {
        error!("failed to reset wizard state: {e}");
    }
    let text = format!(
        "Воу! Я словил ошибку... Хз как так получилось, но вот всё, что мне известно: {err}"
    );
    if let Err(e) = send_plain(bot, chat_id, &text, keyboards::main_keyboard()).await {
        error!("failed to report error to operator: {e}");
    }
}

/// Status screen: account figures, uptime, background toggles
pub async fn status(
    bot: Bot,
    msg: Message,
    toggles: Arc<ToggleManager>,
    snapshot: SharedSnapshot,
) -> Result<()> {
    let snap = snapshot.read().await;
    let current = toggles.current().await;
    let now = Utc::now();

    let uptime = (now - snap.started_at).to_std().unwrap_or(Duration::ZERO);
    let since_update = (now - snap.last_update).to_std().unwrap_or(Duration::ZERO);

    let text = format!(
        "🔥 <b>Статус</b> 🔥\n\n\
         🔑 Аккаунт: <code>{}</code>\n\
         💰 Баланс: <code>{}</code>\n\
         🛍️ Продажи: <code>{}</code>\n\
         ♻️ Последнее обновление: <code>{} назад</code>\n\n\
         🕒 Время работы: <code>{}</code>\n\
         ⏲ Всегда онлайн: <code>{}</code>\n\
         🏆 Автоподнятие предложений: <code>{}</code>",
        html_escape::encode_text(&snap.account),
        html_escape::encode_text(&snap.balance),
        html_escape::encode_text(&snap.sales),
        utils::format_ago_ru(since_update),
        utils::format_duration_ru(uptime),
        on_off(current.always_online),
        on_off(current.auto_raise),
    );
    send_html(&bot, msg.chat.id, &text, Some(keyboards::main_keyboard())).await
}

/// Toggle menu with current values
pub async fn config_menu(bot: Bot, msg: Message, toggles: Arc<ToggleManager>) -> Result<()> {
    let t = toggles.current().await;
    let text = format!(
        "⚙️ Конфиг:\n\n\
         ⬆️ Автоподнятие предложений: <b>{}</b>\n\
         🟢 Всегда онлайн: <b>{}</b>\n\n\
         1. 📦 Уведомления о новых заказах (не автовыдача): <b>{}</b>\n\
         2. ✉️ Уведомления о новых сообщениях: <b>{}</b>\n\
         3. ⬆️ Уведомления о поднятиях: <b>{}</b>\n\
         4. 🚚 Уведомления о выдаче товара: <b>{}</b>\n\n\
         Чтобы не обновлялся ваш онлайн на сайте, отключите все настройки.",
        on_off(t.auto_raise),
        on_off(t.always_online),
        on_off(t.order_notify),
        on_off(t.message_notify),
        on_off(t.raise_notify),
        on_off(t.delivery_notify),
    );
    send_html(&bot, msg.chat.id, &text, Some(keyboards::config_keyboard())).await
}

/// Flip one toggle and echo the persisted value
pub async fn toggle_setting(
    bot: Bot,
    msg: Message,
    toggles: Arc<ToggleManager>,
    toggle: Toggle,
) -> Result<()> {
    let value = toggles.toggle(toggle).await?;
    let text = format!("{}: <b>{}</b>", toggle.label(), on_off(value));
    send_html(&bot, msg.chat.id, &text, Some(keyboards::config_keyboard())).await
}

/// Set all six toggles at once
pub async fn toggle_all(
    bot: Bot,
    msg: Message,
    toggles: Arc<ToggleManager>,
    enable: bool,
) -> Result<()> {
    toggles.toggle_all(enable).await?;
    let text = format!(
        "✅ Все настройки были: <b>{}</b>!",
        if enable { "Включены" } else { "Отключены" }
    );
    send_html(&bot, msg.chat.id, &text, Some(keyboards::config_keyboard())).await
}

/// Stream the catalog as numbered lines, batched under the reply limit
pub async fn edit_catalog(bot: Bot, msg: Message, catalog: Arc<CatalogStore>) -> Result<()> {
    let products = catalog.all().await?;
    send_html(
        &bot,
        msg.chat.id,
        "📄 <b>Список товаров</b> 📄",
        Some(keyboards::edit_catalog_keyboard()),
    )
    .await?;

    let lines: Vec<String> = products
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}", i + 1, html_escape::encode_text(p.name())))
        .collect();
    for batch in utils::chunk_lines(&lines, utils::LISTING_BATCH_LIMIT) {
        send_html(
            &bot,
            msg.chat.id,
            &batch,
            Some(keyboards::edit_catalog_keyboard()),
        )
        .await?;
    }
    Ok(())
}

/// Static about screen
pub async fn info(bot: Bot, msg: Message) -> Result<()> {
    let text = "❔ <b>Lotkeeper</b> ❔\n\n\
        <b>Lotkeeper</b> — панель управления торговым ботом для площадки funpay.com: \
        автовыдача товаров, автоподнятие предложений и уведомления о событиях магазина.\n\n\
        Управление доступно только владельцу, указанному в конфигурации.";
    send_html(&bot, msg.chat.id, text, None).await
}

/// Ask which kind of product to add
pub async fn add_product(bot: Bot, msg: Message) -> Result<()> {
    send_html(
        &bot,
        msg.chat.id,
        "Выбери тип предложения",
        Some(keyboards::lot_type_keyboard()),
    )
    .await
}

/// Lot type chosen, start collecting the name
pub async fn choose_lot_type(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    lot_type: LotType,
) -> Result<()> {
    dialogue
        .update(State::AwaitingLotName { lot_type })
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    send_html(
        &bot,
        msg.chat.id,
        "Окей, отправь мне название предложения. Можешь просто скопировать его \
         с витрины. Эмодзи в названии поддерживаются.",
        Some(keyboards::back_keyboard()),
    )
    .await
}

/// Name received, start collecting content
pub async fn save_lot_name(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    lot_type: LotType,
) -> Result<()> {
    let name = msg.text().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return send_html(
            &bot,
            msg.chat.id,
            "Название не может быть пустым. Отправь мне название предложения.",
            Some(keyboards::back_keyboard()),
        )
        .await;
    }

    dialogue
        .update(State::AwaitingLotContent {
            lot_type,
            name: name.to_string(),
            pending_nodes: Vec::new(),
        })
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    let reply = match lot_type {
        LotType::Instruction => {
            "Понял-принял. Теперь отправь мне сообщение, которое будет выдано \
             покупателю после оплаты."
        }
        LotType::Accounts => {
            "Понял-принял. Теперь отправь мне сообщение, которое будет выдано \
             покупателю после оплаты. Ты можешь отправить несколько сообщений — \
             каждое будет выдано после очередной покупки. Нажми \"🔙 Назад 🔙\", \
             когда закончишь заполнять товар."
        }
    };
    send_html(&bot, msg.chat.id, reply, Some(keyboards::back_keyboard())).await
}

/// Content received: finalize an instruction lot, or buffer one more node
/// of an accounts lot (that state is re-entrant until the back command)
pub async fn save_lot_content(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
    payload: (LotType, String, Vec<String>),
) -> Result<()> {
    let (lot_type, name, mut pending_nodes) = payload;
    let text = msg.text().unwrap_or_default().to_string();

    match lot_type {
        LotType::Instruction => {
            catalog
                .add(Product::Instruction {
                    name,
                    message: text,
                })
                .await?;
            dialogue
                .update(State::Idle)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            send_plain(&bot, msg.chat.id, SAVED_TEXT, keyboards::main_keyboard()).await
        }
        LotType::Accounts => {
            pending_nodes.push(text);
            dialogue
                .update(State::AwaitingLotContent {
                    lot_type,
                    name,
                    pending_nodes,
                })
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            send_plain(&bot, msg.chat.id, SAVED_TEXT, keyboards::back_keyboard()).await
        }
    }
}

/// Ask for the 1-based index to delete
pub async fn remove_product(bot: Bot, msg: Message, dialogue: BotDialogue) -> Result<()> {
    dialogue
        .update(State::AwaitingLotDelete)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    send_html(
        &bot,
        msg.chat.id,
        "Введи номер товара, который нужно удалить из списка автовыдачи.",
        Some(keyboards::back_keyboard()),
    )
    .await
}

/// Index received: validate, delete, confirm with the removed name
pub async fn delete_lot(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
) -> Result<()> {
    dialogue
        .update(State::Idle)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    let text = msg.text().unwrap_or_default();
    let len = catalog.all().await?.len();
    match parse_delete_index(text, len) {
        Ok(index) => {
            let name = catalog.remove(index).await?;
            send_plain(
                &bot,
                msg.chat.id,
                &format!("Ок, удалил товар \"{name}\" из списка автовыдачи."),
                keyboards::main_keyboard(),
            )
            .await
        }
        Err(DeleteIndexError::NotNumeric(_)) => {
            send_plain(
                &bot,
                msg.chat.id,
                "Что-то это не похоже на число... Верну тебя в меню.",
                keyboards::main_keyboard(),
            )
            .await
        }
        Err(DeleteIndexError::OutOfRange(..)) => {
            send_plain(
                &bot,
                msg.chat.id,
                "Такого id нет в списке автовыдачи. Верну тебя в меню.",
                keyboards::main_keyboard(),
            )
            .await
        }
    }
}

/// Export: the persisted catalog document verbatim, as an attachment
pub async fn download_file(bot: Bot, msg: Message, catalog: Arc<CatalogStore>) -> Result<()> {
    let bytes = catalog.raw_bytes().await?;
    bot.send_document(
        msg.chat.id,
        InputFile::memory(bytes).file_name(CATALOG_FILE_NAME),
    )
    .await?;
    Ok(())
}

/// Import step 1: ask for the document
pub async fn upload_file(bot: Bot, msg: Message, dialogue: BotDialogue) -> Result<()> {
    dialogue
        .update(State::AwaitingDeliveryFile)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    send_plain(
        &bot,
        msg.chat.id,
        "Окей, пришли мне файл автовыдачи в формате JSON.",
        keyboards::back_keyboard(),
    )
    .await
}

/// Import step 2: validate the upload and replace the whole catalog.
/// Any rejection leaves the existing catalog untouched.
pub async fn receive_delivery_file(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
    settings: Arc<Settings>,
) -> Result<()> {
    dialogue
        .update(State::Idle)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    let Some(doc) = msg.document() else {
        return send_plain(
            &bot,
            msg.chat.id,
            "❌ Неверный формат файла.",
            keyboards::main_keyboard(),
        )
        .await;
    };
    if doc.file_name.as_deref() != Some(CATALOG_FILE_NAME) {
        return send_plain(
            &bot,
            msg.chat.id,
            "❌ Неверный формат файла.",
            keyboards::main_keyboard(),
        )
        .await;
    }

    send_plain(&bot, msg.chat.id, "♻️ Загружаю файл...", keyboards::back_keyboard()).await?;
    let contents = match fetch_document(&bot, doc, settings.import_timeout_secs).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("catalog import fetch failed: {e:#}");
            return send_plain(
                &bot,
                msg.chat.id,
                "❌ Не удалось загрузить файл.",
                keyboards::main_keyboard(),
            )
            .await;
        }
    };

    send_plain(&bot, msg.chat.id, "♻️ Проверяю валидность...", keyboards::back_keyboard()).await?;
    match parse_catalog_document(&contents) {
        Ok(products) => {
            catalog.replace(products).await?;
            info!("catalog replaced from uploaded file");
            send_plain(
                &bot,
                msg.chat.id,
                "✔️ Окей, обновил файл автовыдачи.",
                keyboards::edit_catalog_keyboard(),
            )
            .await
        }
        Err(e) => {
            warn!("catalog import rejected, malformed JSON: {e}");
            send_plain(
                &bot,
                msg.chat.id,
                "❌ Неверный формат JSON.",
                keyboards::main_keyboard(),
            )
            .await
        }
    }
}

async fn fetch_document(
    bot: &Bot,
    doc: &teloxide::types::Document,
    timeout_secs: u64,
) -> Result<Vec<u8>> {
    let fetch = async {
        let file = bot.get_file(doc.file.id.clone()).await?;
        let mut buf = Vec::new();
        bot.download_file(&file.path, &mut buf).await?;
        Ok::<_, anyhow::Error>(buf)
    };
    tokio::time::timeout(Duration::from_secs(timeout_secs), fetch)
        .await
        .context("timed out fetching the uploaded file")?
}

/// Back command: finalize a pending accounts product if one is being built,
/// then return to the home menu
pub async fn back(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
) -> Result<()> {
    if let Some(State::AwaitingLotContent {
        lot_type: LotType::Accounts,
        name,
        pending_nodes,
    }) = dialogue.get().await.map_err(|e| anyhow!(e.to_string()))?
    {
        if let Some(product) = finalize_accounts(name, pending_nodes) {
            catalog.add(product).await?;
        }
    }

    dialogue
        .update(State::Idle)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    send_plain(&bot, msg.chat.id, MENU_TEXT, keyboards::main_keyboard()).await
}

/// Anything that matched neither a command nor a pending state
pub async fn fallback(bot: Bot, msg: Message, dialogue: BotDialogue) -> Result<()> {
    dialogue
        .update(State::Idle)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    send_plain(&bot, msg.chat.id, MENU_TEXT, keyboards::main_keyboard()).await
}

/// Reply sent to anyone who is not the configured owner
pub const ONBOARDING_TEXT: &str = "Привет! 😄\nЭтим ботом управляет только его владелец. \
    Для авторизации укажи свой ник в настройках бота (owner_username), после чего перезапусти его.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::commands::LABEL_BACK;

    #[test]
    fn on_off_renders_russian_values() {
        assert_eq!(on_off(true), "Вкл");
        assert_eq!(on_off(false), "Выкл");
    }

    #[test]
    fn back_label_is_part_of_the_vocabulary() {
        // The accounts wizard tells the operator to press this exact button.
        assert_eq!(LABEL_BACK, "🔙 Назад 🔙");
    }
}
