//! Menu command vocabulary
//!
//! The decorative button labels are mapped to a structured enum at the
//! transport boundary; dispatch works on the enum only, so the UI vocabulary
//! can change without touching routing logic.

use crate::catalog::LotType;
use crate::toggles::Toggle;

pub const LABEL_STATUS: &str = "🔥 Статус 🔥";
pub const LABEL_CONFIG: &str = "⚙️ Конфиг ⚙️";
pub const LABEL_ALWAYS_ONLINE: &str = "🟢 Всегда онлайн 🟢";
pub const LABEL_AUTO_RAISE: &str = "⬆️ Автоподнятие предложений ⬆️";
pub const LABEL_ORDER_NOTIFY: &str = "1. 📦";
pub const LABEL_MESSAGE_NOTIFY: &str = "2. ✉️";
pub const LABEL_RAISE_NOTIFY: &str = "3. ⬆️";
pub const LABEL_DELIVERY_NOTIFY: &str = "4. 🚚";
pub const LABEL_DISABLE_ALL: &str = "🔥 Отключить всё 🔥";
pub const LABEL_ENABLE_ALL: &str = "✅ Включить всё ✅";
pub const LABEL_EDIT_CATALOG: &str = "🚀 Редактировать автовыдачу 🚀";
pub const LABEL_INFO: &str = "❔ Инфо ❔";
pub const LABEL_ADD_PRODUCT: &str = "☑️ Добавить товар ☑️";
pub const LABEL_REMOVE_PRODUCT: &str = "📛 Удалить товар 📛";
pub const LABEL_LOT_TYPE_INSTRUCTION: &str = "Инструкция (выдача одного и того же текста)";
pub const LABEL_LOT_TYPE_ACCOUNTS: &str = "Аккаунты (выдача разных текстов по очереди)";
pub const LABEL_DOWNLOAD_FILE: &str = "⬇️ Получить файл автовыдачи ⬇️";
pub const LABEL_UPLOAD_FILE: &str = "⬆️ Загрузить файл автовыдачи ⬆️";
pub const LABEL_BACK: &str = "🔙 Назад 🔙";

/// One entry of the fixed menu vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    ConfigMenu,
    Toggle(Toggle),
    DisableAll,
    EnableAll,
    EditCatalog,
    Info,
    AddProduct,
    RemoveProduct,
    ChooseLotType(LotType),
    DownloadFile,
    UploadFile,
    Back,
}

impl Command {
    /// Exact-match a message text against the menu vocabulary
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            LABEL_STATUS => Some(Self::Status),
            LABEL_CONFIG => Some(Self::ConfigMenu),
            LABEL_ALWAYS_ONLINE => Some(Self::Toggle(Toggle::AlwaysOnline)),
            LABEL_AUTO_RAISE => Some(Self::Toggle(Toggle::AutoRaise)),
            LABEL_ORDER_NOTIFY => Some(Self::Toggle(Toggle::OrderNotify)),
            LABEL_MESSAGE_NOTIFY => Some(Self::Toggle(Toggle::MessageNotify)),
            LABEL_RAISE_NOTIFY => Some(Self::Toggle(Toggle::RaiseNotify)),
            LABEL_DELIVERY_NOTIFY => Some(Self::Toggle(Toggle::DeliveryNotify)),
            LABEL_DISABLE_ALL => Some(Self::DisableAll),
            LABEL_ENABLE_ALL => Some(Self::EnableAll),
            LABEL_EDIT_CATALOG => Some(Self::EditCatalog),
            LABEL_INFO => Some(Self::Info),
            LABEL_ADD_PRODUCT => Some(Self::AddProduct),
            LABEL_REMOVE_PRODUCT => Some(Self::RemoveProduct),
            LABEL_LOT_TYPE_INSTRUCTION => Some(Self::ChooseLotType(LotType::Instruction)),
            LABEL_LOT_TYPE_ACCOUNTS => Some(Self::ChooseLotType(LotType::Accounts)),
            LABEL_DOWNLOAD_FILE => Some(Self::DownloadFile),
            LABEL_UPLOAD_FILE => Some(Self::UploadFile),
            LABEL_BACK => Some(Self::Back),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_maps_to_its_command() {
        assert_eq!(Command::parse(LABEL_STATUS), Some(Command::Status));
        assert_eq!(
            Command::parse(LABEL_ALWAYS_ONLINE),
            Some(Command::Toggle(Toggle::AlwaysOnline))
        );
        assert_eq!(
            Command::parse(LABEL_LOT_TYPE_ACCOUNTS),
            Some(Command::ChooseLotType(LotType::Accounts))
        );
        assert_eq!(Command::parse(LABEL_BACK), Some(Command::Back));
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert_eq!(Command::parse("что-нибудь"), None);
        // Near-misses must not match: the vocabulary is exact.
        assert_eq!(Command::parse("🔥 Статус"), None);
        assert_eq!(Command::parse(" 🔥 Статус 🔥"), None);
    }
}
