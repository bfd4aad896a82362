//! Reply keyboards for the operator menus

use super::commands as cmd;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

fn make(rows: Vec<Vec<&'static str>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
    .resize_keyboard()
}

/// Home menu
#[must_use]
pub fn main_keyboard() -> KeyboardMarkup {
    make(vec![
        vec![cmd::LABEL_STATUS],
        vec![cmd::LABEL_EDIT_CATALOG],
        vec![cmd::LABEL_INFO],
        vec![cmd::LABEL_CONFIG],
    ])
}

/// Catalog editing menu
#[must_use]
pub fn edit_catalog_keyboard() -> KeyboardMarkup {
    make(vec![
        vec![cmd::LABEL_ADD_PRODUCT, cmd::LABEL_REMOVE_PRODUCT],
        vec![cmd::LABEL_DOWNLOAD_FILE, cmd::LABEL_UPLOAD_FILE],
        vec![cmd::LABEL_BACK],
    ])
}

/// Toggle menu
#[must_use]
pub fn config_keyboard() -> KeyboardMarkup {
    make(vec![
        vec![cmd::LABEL_ALWAYS_ONLINE, cmd::LABEL_AUTO_RAISE],
        vec![
            cmd::LABEL_ORDER_NOTIFY,
            cmd::LABEL_MESSAGE_NOTIFY,
            cmd::LABEL_RAISE_NOTIFY,
            cmd::LABEL_DELIVERY_NOTIFY,
        ],
        vec![cmd::LABEL_DISABLE_ALL, cmd::LABEL_ENABLE_ALL],
        vec![cmd::LABEL_BACK],
    ])
}

/// Lot-type choice for the add-product wizard
#[must_use]
pub fn lot_type_keyboard() -> KeyboardMarkup {
    make(vec![
        vec![cmd::LABEL_LOT_TYPE_INSTRUCTION],
        vec![cmd::LABEL_LOT_TYPE_ACCOUNTS],
        vec![cmd::LABEL_BACK],
    ])
}

/// Lone back button, shown while a wizard is collecting input
#[must_use]
pub fn back_keyboard() -> KeyboardMarkup {
    make(vec![vec![cmd::LABEL_BACK]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::commands::Command;

    #[test]
    fn every_keyboard_button_is_in_the_vocabulary() {
        for keyboard in [
            main_keyboard(),
            edit_catalog_keyboard(),
            config_keyboard(),
            lot_type_keyboard(),
            back_keyboard(),
        ] {
            for row in &keyboard.keyboard {
                for button in row {
                    assert!(
                        Command::parse(&button.text).is_some(),
                        "button '{}' does not parse as a command",
                        button.text
                    );
                }
            }
        }
    }
}
