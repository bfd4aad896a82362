use dotenvy::dotenv;
use lotkeeper::bot::commands::Command;
use lotkeeper::bot::handlers::{self, BotDialogue};
use lotkeeper::bot::state::State;
use lotkeeper::bot::{AuthGuard, OnboardingCache};
use lotkeeper::catalog::{CatalogStore, LotType};
use lotkeeper::config::Settings;
use lotkeeper::market::{MarketSnapshot, SharedSnapshot};
use lotkeeper::storage::FileStorage;
use lotkeeper::toggles::ToggleManager;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::InlineQuery;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    info!("Starting lotkeeper control panel...");

    let settings = init_settings();
    let storage = init_storage(&settings).await;

    let catalog = Arc::new(CatalogStore::new(storage.clone(), settings.catalog_path()));
    let toggles = init_toggles(storage.clone()).await;
    let guard = Arc::new(AuthGuard::new(
        settings.owner_username.clone(),
        storage.clone(),
    ));
    let onboarding = Arc::new(OnboardingCache::new(Duration::from_secs(
        settings.onboarding_cooldown_secs,
    )));
    let snapshot = SharedSnapshot::new(MarketSnapshot::starting_now());

    let bot = Bot::new(settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<State>::new(),
            settings,
            catalog,
            toggles,
            guard,
            onboarding,
            snapshot
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_storage(settings: &Settings) -> Arc<FileStorage> {
    match FileStorage::new(settings.settings_path(), settings.consts_path()).await {
        Ok(s) => {
            info!("File storage initialized at '{}'.", settings.data_dir);
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_toggles(storage: Arc<FileStorage>) -> Arc<ToggleManager> {
    match ToggleManager::load(storage).await {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("Failed to read the settings document: {}", e);
            std::process::exit(1);
        }
    }
}

/// Routing policy, in precedence order: authorization, then the fixed menu
/// vocabulary, then the pending wizard state, then the home-menu fallback.
/// Menu commands deliberately preempt in-progress wizard input.
fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handle_inline_query))
        .branch(
            Update::filter_message().branch(
                dptree::filter_async(|msg: Message, guard: Arc<AuthGuard>| async move {
                    guard.authenticate(&msg).await
                })
                .enter_dialogue::<Message, InMemStorage<State>, State>()
                .branch(
                    dptree::filter_map(|msg: Message| msg.text().and_then(Command::parse))
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::case![State::AwaitingLotName { lot_type }].endpoint(handle_lot_name),
                )
                .branch(
                    dptree::case![State::AwaitingLotContent {
                        lot_type,
                        name,
                        pending_nodes
                    }]
                    .endpoint(handle_lot_content),
                )
                .branch(dptree::case![State::AwaitingLotDelete].endpoint(handle_lot_delete))
                .branch(
                    dptree::case![State::AwaitingDeliveryFile].endpoint(handle_delivery_file),
                )
                .branch(dptree::entry().endpoint(handle_fallback)),
            ),
        )
        .branch(Update::filter_message().endpoint(handle_onboarding))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
    toggles: Arc<ToggleManager>,
    snapshot: SharedSnapshot,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    let res = match cmd {
        Command::Status => handlers::status(bot.clone(), msg, toggles, snapshot).await,
        Command::ConfigMenu => handlers::config_menu(bot.clone(), msg, toggles).await,
        Command::Toggle(toggle) => {
            handlers::toggle_setting(bot.clone(), msg, toggles, toggle).await
        }
        Command::DisableAll => handlers::toggle_all(bot.clone(), msg, toggles, false).await,
        Command::EnableAll => handlers::toggle_all(bot.clone(), msg, toggles, true).await,
        Command::EditCatalog => handlers::edit_catalog(bot.clone(), msg, catalog).await,
        Command::Info => handlers::info(bot.clone(), msg).await,
        Command::AddProduct => handlers::add_product(bot.clone(), msg).await,
        Command::RemoveProduct => {
            handlers::remove_product(bot.clone(), msg, dialogue.clone()).await
        }
        Command::ChooseLotType(lot_type) => {
            handlers::choose_lot_type(bot.clone(), msg, dialogue.clone(), lot_type).await
        }
        Command::DownloadFile => handlers::download_file(bot.clone(), msg, catalog).await,
        Command::UploadFile => handlers::upload_file(bot.clone(), msg, dialogue.clone()).await,
        Command::Back => handlers::back(bot.clone(), msg, dialogue.clone(), catalog).await,
    };
    if let Err(e) = res {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_lot_name(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    lot_type: LotType,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) = handlers::save_lot_name(bot.clone(), msg, dialogue.clone(), lot_type).await {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_lot_content(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
    payload: (LotType, String, Vec<String>),
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) =
        handlers::save_lot_content(bot.clone(), msg, dialogue.clone(), catalog, payload).await
    {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_lot_delete(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) = handlers::delete_lot(bot.clone(), msg, dialogue.clone(), catalog).await {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_delivery_file(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    catalog: Arc<CatalogStore>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) =
        handlers::receive_delivery_file(bot.clone(), msg, dialogue.clone(), catalog, settings)
            .await
    {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_fallback(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) = handlers::fallback(bot.clone(), msg, dialogue.clone()).await {
        handlers::report_unhandled(&bot, chat_id, &dialogue, &e).await;
    }
    respond(())
}

async fn handle_onboarding(
    bot: Bot,
    msg: Message,
    cache: Arc<OnboardingCache>,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if cache.should_send(chat_id.0).await {
        info!("onboarding reply to unauthenticated chat {chat_id}");
        if let Err(e) = bot.send_message(chat_id, handlers::ONBOARDING_TEXT).await {
            error!("failed to send onboarding reply to {chat_id}: {e}");
        } else {
            cache.mark_sent(chat_id.0).await;
        }
    }
    respond(())
}

/// Inline queries are received but intentionally unhandled beyond logging
async fn handle_inline_query(q: InlineQuery) -> Result<(), teloxide::RequestError> {
    info!("ignoring inline query from {}", q.from.id);
    respond(())
}
