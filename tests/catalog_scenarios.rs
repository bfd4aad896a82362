//! End-to-end scenarios for the catalog editor and toggle manager, run
//! against the real file-backed storage in a throwaway data directory.

use lotkeeper::catalog::{
    finalize_accounts, parse_catalog_document, parse_delete_index, CatalogStore, Product,
};
use lotkeeper::storage::{FileStorage, Store};
use lotkeeper::toggles::{Toggle, ToggleManager};
use std::path::PathBuf;
use std::sync::Arc;

struct Fixture {
    storage: Arc<FileStorage>,
    catalog: CatalogStore,
    catalog_path: PathBuf,
}

async fn fixture() -> Fixture {
    let dir = std::env::temp_dir().join(format!("lotkeeper-it-{}", uuid::Uuid::new_v4()));
    let storage = Arc::new(
        FileStorage::new(dir.join("configs/settings.json"), dir.join("consts.json"))
            .await
            .expect("create storage"),
    );
    let catalog_path = dir.join("configs/delivery.json");
    Fixture {
        catalog: CatalogStore::new(storage.clone(), catalog_path.clone()),
        storage,
        catalog_path,
    }
}

fn instruction(name: &str, message: &str) -> Product {
    Product::Instruction {
        name: name.to_string(),
        message: message.to_string(),
    }
}

#[tokio::test]
async fn add_instruction_product_to_empty_catalog() {
    let f = fixture().await;

    f.catalog
        .add(instruction("Coins", "code123"))
        .await
        .expect("add");

    assert_eq!(
        f.catalog.all().await.expect("read"),
        vec![instruction("Coins", "code123")]
    );
}

#[tokio::test]
async fn delete_second_of_three_names_the_removed_product() {
    let f = fixture().await;
    for name in ["A", "B", "C"] {
        f.catalog.add(instruction(name, "m")).await.expect("add");
    }

    let index = parse_delete_index("2", 3).expect("valid index");
    assert_eq!(f.catalog.remove(index).await.expect("remove"), "B");
    assert_eq!(
        f.catalog.all().await.expect("read"),
        vec![instruction("A", "m"), instruction("C", "m")]
    );
}

#[tokio::test]
async fn out_of_range_delete_is_rejected_and_catalog_unchanged() {
    let f = fixture().await;
    for name in ["A", "B", "C"] {
        f.catalog.add(instruction(name, "m")).await.expect("add");
    }
    let before = f.catalog.all().await.expect("read");

    assert!(parse_delete_index("5", before.len()).is_err());
    assert!(parse_delete_index("0", before.len()).is_err());

    assert_eq!(f.catalog.all().await.expect("read"), before);
}

#[tokio::test]
async fn accounts_wizard_collects_nodes_in_send_order() {
    let f = fixture().await;

    // The content state buffers each message; back finalizes.
    let mut pending = Vec::new();
    for node in ["a", "b", "c"] {
        pending.push(node.to_string());
    }
    let product =
        finalize_accounts("Steam".to_string(), pending).expect("non-empty buffer finalizes");
    f.catalog.add(product).await.expect("add");

    assert_eq!(
        f.catalog.all().await.expect("read"),
        vec![Product::Accounts {
            name: "Steam".to_string(),
            nodes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }]
    );
}

#[tokio::test]
async fn export_then_import_reproduces_the_catalog() {
    let f = fixture().await;
    f.catalog.add(instruction("Coins", "code123")).await.expect("add");
    f.catalog
        .add(Product::Accounts {
            name: "Steam".to_string(),
            nodes: vec!["a".to_string(), "b".to_string()],
        })
        .await
        .expect("add");
    let before = f.catalog.all().await.expect("read");

    // Export is the persisted document verbatim; importing it back must be
    // a lossless round trip.
    let exported = f.catalog.raw_bytes().await.expect("export");
    let reimported = parse_catalog_document(&exported).expect("parse export");
    f.catalog.replace(reimported).await.expect("replace");

    assert_eq!(f.catalog.all().await.expect("read"), before);
}

#[tokio::test]
async fn malformed_import_leaves_catalog_bytes_unchanged() {
    let f = fixture().await;
    f.catalog.add(instruction("Coins", "code123")).await.expect("add");
    let before = f.storage.read_raw(&f.catalog_path).await.expect("read raw");

    // The import path parses before replacing; a malformed document never
    // reaches the write.
    assert!(parse_catalog_document(b"{ not json").is_err());
    assert!(parse_catalog_document(br#"{"name":"x"}"#).is_err());

    let after = f.storage.read_raw(&f.catalog_path).await.expect("read raw");
    assert_eq!(before, after);
}

#[tokio::test]
async fn toggle_twice_round_trips_with_two_persisted_writes() {
    let f = fixture().await;
    let store: Arc<dyn Store> = f.storage.clone();
    let manager = ToggleManager::load(store).await.expect("load toggles");

    assert!(!manager.current().await.always_online);

    assert!(manager.toggle(Toggle::AlwaysOnline).await.expect("first"));
    let persisted = f.storage.read_settings().await.expect("read settings");
    assert!(persisted.always_online, "intermediate value is persisted");

    assert!(!manager.toggle(Toggle::AlwaysOnline).await.expect("second"));
    let persisted = f.storage.read_settings().await.expect("read settings");
    assert!(!persisted.always_online);
}
