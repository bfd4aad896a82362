//! Auto-issue catalog: product model and serialized persistence
//!
//! The catalog is one JSON array document. Order is significant: "accounts"
//! products issue their nodes round-robin across successive sales, and the
//! operator deletes by the 1-based position shown in the listing. Every
//! mutation is a read-full-document / mutate / write-full-document cycle,
//! so all of them run under one mutex — two interleaved appends would
//! otherwise lose a write.

use crate::storage::{Store, StorageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Which kind of product the add-product wizard is building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotType {
    /// The same message is issued on every sale
    Instruction,
    /// Each node is issued once, in order, across successive sales
    Accounts,
}

/// One sellable definition in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Product {
    Instruction { name: String, message: String },
    Accounts { name: String, nodes: Vec<String> },
}

impl Product {
    /// Display name shown in listings and deletion confirmations
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Instruction { name, .. } | Self::Accounts { name, .. } => name,
        }
    }
}

/// Rejection reasons for a delete-by-index request
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeleteIndexError {
    #[error("not a number: {0}")]
    NotNumeric(String),
    #[error("index {0} out of range 1..={1}")]
    OutOfRange(i64, usize),
}

/// Parse the operator's delete request into a 0-based index
///
/// Accepts base-10 integers `n` with `1 <= n <= len`. Zero and negatives are
/// rejected, same as indices past the end.
///
/// # Errors
///
/// Returns the rejection reason; callers reply and reset without touching
/// the catalog.
pub fn parse_delete_index(text: &str, len: usize) -> Result<usize, DeleteIndexError> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| DeleteIndexError::NotNumeric(text.to_string()))?;
    if n < 1 || n > len as i64 {
        return Err(DeleteIndexError::OutOfRange(n, len));
    }
    Ok((n - 1) as usize)
}

/// Parse an uploaded catalog document
///
/// The import path replaces the whole file, so the upload must be a JSON
/// array of products; anything else is rejected before the catalog is
/// touched.
///
/// # Errors
///
/// Returns the JSON error for malformed or wrongly-shaped documents.
pub fn parse_catalog_document(bytes: &[u8]) -> Result<Vec<Product>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Finalize the accounts wizard buffer into a product, if anything was sent
#[must_use]
pub fn finalize_accounts(name: String, nodes: Vec<String>) -> Option<Product> {
    if nodes.is_empty() {
        return None;
    }
    Some(Product::Accounts { name, nodes })
}

/// Serialized accessor for the catalog document
pub struct CatalogStore {
    store: Arc<dyn Store>,
    path: PathBuf,
    // Single-writer guard for the catalog resource, independent from the
    // settings lock.
    lock: Mutex<()>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, path: PathBuf) -> Self {
        Self {
            store,
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Vec<Product>, StorageError> {
        match self.store.load(&self.path).await? {
            serde_json::Value::Null => Ok(Vec::new()),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    async fn write(&self, products: &[Product]) -> Result<(), StorageError> {
        let doc = serde_json::to_value(products)?;
        self.store.update_file(&doc, &self.path).await
    }

    /// Current catalog, in persisted order
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    pub async fn all(&self) -> Result<Vec<Product>, StorageError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Append one product and persist
    ///
    /// # Errors
    ///
    /// Returns an error if the read-modify-write cycle fails.
    pub async fn add(&self, product: Product) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut products = self.read().await?;
        info!("catalog: adding '{}'", product.name());
        products.push(product);
        self.write(&products).await
    }

    /// Remove the product at a 0-based index, returning its name
    ///
    /// # Errors
    ///
    /// Returns an error if the index is past the end or the write fails.
    pub async fn remove(&self, index: usize) -> Result<String, StorageError> {
        let _guard = self.lock.lock().await;
        let mut products = self.read().await?;
        if index >= products.len() {
            return Err(StorageError::Malformed(
                self.path.display().to_string(),
                format!("index {index} past catalog end {}", products.len()),
            ));
        }
        let removed = products.remove(index);
        self.write(&products).await?;
        info!("catalog: removed '{}'", removed.name());
        Ok(removed.name().to_string())
    }

    /// Replace the whole document (import path), not a merge
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is changed then.
    pub async fn replace(&self, products: Vec<Product>) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        info!("catalog: replacing with {} products", products.len());
        self.write(&products).await
    }

    /// The persisted document verbatim, for the export attachment.
    /// A catalog that was never written exports as an empty array.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn raw_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let _guard = self.lock.lock().await;
        match self.store.read_raw(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(b"[]".to_vec())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;

    async fn temp_catalog() -> CatalogStore {
        let dir = std::env::temp_dir().join(format!("lotkeeper-test-{}", uuid::Uuid::new_v4()));
        let storage = FileStorage::new(dir.join("configs/settings.json"), dir.join("consts.json"))
            .await
            .expect("create storage");
        CatalogStore::new(Arc::new(storage), dir.join("configs/delivery.json"))
    }

    fn instruction(name: &str, message: &str) -> Product {
        Product::Instruction {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_catalog_then_add_instruction() {
        let catalog = temp_catalog().await;
        assert!(catalog.all().await.expect("read").is_empty());

        catalog
            .add(instruction("Coins", "code123"))
            .await
            .expect("add");
        assert_eq!(
            catalog.all().await.expect("read"),
            vec![instruction("Coins", "code123")]
        );
    }

    #[tokio::test]
    async fn remove_middle_keeps_order_and_names_removed() {
        let catalog = temp_catalog().await;
        for name in ["A", "B", "C"] {
            catalog.add(instruction(name, "m")).await.expect("add");
        }

        let index = parse_delete_index("2", 3).expect("parse");
        let removed = catalog.remove(index).await.expect("remove");
        assert_eq!(removed, "B");
        assert_eq!(
            catalog.all().await.expect("read"),
            vec![instruction("A", "m"), instruction("C", "m")]
        );
    }

    #[tokio::test]
    async fn untagged_product_round_trips_both_shapes() {
        let catalog = temp_catalog().await;
        catalog.add(instruction("Coins", "code123")).await.expect("add");
        catalog
            .add(Product::Accounts {
                name: "Steam".to_string(),
                nodes: vec!["a".to_string(), "b".to_string()],
            })
            .await
            .expect("add");

        let raw = catalog.raw_bytes().await.expect("raw");
        let reparsed: Vec<Product> = serde_json::from_slice(&raw).expect("parse");
        assert_eq!(reparsed, catalog.all().await.expect("read"));
    }

    #[test]
    fn delete_index_validation() {
        assert_eq!(parse_delete_index("2", 3), Ok(1));
        assert_eq!(
            parse_delete_index("0", 3),
            Err(DeleteIndexError::OutOfRange(0, 3))
        );
        assert_eq!(
            parse_delete_index("5", 3),
            Err(DeleteIndexError::OutOfRange(5, 3))
        );
        assert_eq!(
            parse_delete_index("-1", 3),
            Err(DeleteIndexError::OutOfRange(-1, 3))
        );
        assert!(matches!(
            parse_delete_index("abc", 3),
            Err(DeleteIndexError::NotNumeric(_))
        ));
    }

    #[test]
    fn accounts_finalization_drops_empty_buffers() {
        assert_eq!(finalize_accounts("Steam".to_string(), Vec::new()), None);
        let product = finalize_accounts(
            "Steam".to_string(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
        .expect("product");
        assert_eq!(
            product,
            Product::Accounts {
                name: "Steam".to_string(),
                nodes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            }
        );
    }
}
