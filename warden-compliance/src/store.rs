//! Durable and in-process receipt stores.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use warden_primitives::ReceiptId;

use crate::{ComplianceError, ComplianceResult};
use crate::receipt::PolicyReceipt;

/// Trait implemented by receipt stores.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Persists a receipt, replacing any receipt with the same identifier.
    async fn save(&self, receipt: &PolicyReceipt) -> ComplianceResult<()>;

    /// Returns the receipt stored under `id`.
    async fn get(&self, id: &ReceiptId) -> ComplianceResult<Option<PolicyReceipt>>;

    /// Returns the receipt stored under `id`, failing when it is absent.
    async fn require(&self, id: &ReceiptId) -> ComplianceResult<PolicyReceipt> {
        self.get(id).await?.ok_or(ComplianceError::NotFound(*id))
    }

    /// Returns at most `limit` receipts for `agent_id`, newest first.
    async fn list_by_agent(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> ComplianceResult<Vec<PolicyReceipt>>;

    /// Returns receipts whose timestamp lies in `[start, end]`, oldest first.
    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<Vec<PolicyReceipt>>;

    /// Removes the receipt stored under `id`, returning whether it existed.
    async fn delete(&self, id: &ReceiptId) -> ComplianceResult<bool>;

    /// Returns the number of stored receipts.
    async fn count(&self) -> ComplianceResult<usize>;
}

fn newest_first(mut receipts: Vec<PolicyReceipt>, limit: usize) -> Vec<PolicyReceipt> {
    receipts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    receipts.truncate(limit);
    receipts
}

fn oldest_first(mut receipts: Vec<PolicyReceipt>) -> Vec<PolicyReceipt> {
    receipts.sort_by_key(|receipt| receipt.timestamp);
    receipts
}

/// In-process store, mostly useful for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryReceiptStore {
    receipts: RwLock<HashMap<ReceiptId, PolicyReceipt>>,
}

impl MemoryReceiptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every stored receipt.
    pub async fn clear(&self) {
        self.receipts.write().await.clear();
        debug!("memory receipt store cleared");
    }
}

#[async_trait]
impl ReceiptStore for MemoryReceiptStore {
    async fn save(&self, receipt: &PolicyReceipt) -> ComplianceResult<()> {
        self.receipts
            .write()
            .await
            .insert(receipt.receipt_id, receipt.clone());
        debug!(receipt_id = %receipt.receipt_id, "receipt saved to memory");
        Ok(())
    }

    async fn get(&self, id: &ReceiptId) -> ComplianceResult<Option<PolicyReceipt>> {
        Ok(self.receipts.read().await.get(id).cloned())
    }

    async fn list_by_agent(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> ComplianceResult<Vec<PolicyReceipt>> {
        let guard = self.receipts.read().await;
        let matching = guard
            .values()
            .filter(|receipt| receipt.agent_id == agent_id)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit))
    }

    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<Vec<PolicyReceipt>> {
        let guard = self.receipts.read().await;
        let matching = guard
            .values()
            .filter(|receipt| start <= receipt.timestamp && receipt.timestamp <= end)
            .cloned()
            .collect();
        Ok(oldest_first(matching))
    }

    async fn delete(&self, id: &ReceiptId) -> ComplianceResult<bool> {
        Ok(self.receipts.write().await.remove(id).is_some())
    }

    async fn count(&self) -> ComplianceResult<usize> {
        Ok(self.receipts.read().await.len())
    }
}

/// Directory-backed store writing one pretty-printed `{receipt_id}.json` file
/// per receipt.
#[derive(Debug)]
pub struct FileReceiptStore {
    dir: PathBuf,
}

impl FileReceiptStore {
    /// Opens (or creates) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while creating the directory.
    pub async fn open(dir: impl Into<PathBuf>) -> ComplianceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "file receipt store opened");
        Ok(Self { dir })
    }

    /// Returns the directory holding the receipt files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn receipt_path(&self, id: &ReceiptId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    async fn receipt_files(&self) -> ComplianceResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Reads every parseable receipt. Unreadable or corrupt files are skipped.
    async fn load_all(&self) -> ComplianceResult<Vec<PolicyReceipt>> {
        let mut receipts = Vec::new();
        for path in self.receipt_files().await? {
            let data = match fs::read(&path).await {
                Ok(data) => data,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable receipt file");
                    continue;
                }
            };
            match serde_json::from_slice::<PolicyReceipt>(&data) {
                Ok(receipt) => receipts.push(receipt),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "invalid receipt file");
                }
            }
        }
        Ok(receipts)
    }
}

#[async_trait]
impl ReceiptStore for FileReceiptStore {
    async fn save(&self, receipt: &PolicyReceipt) -> ComplianceResult<()> {
        let path = self.receipt_path(&receipt.receipt_id);
        let data = serde_json::to_vec_pretty(receipt)?;
        fs::write(&path, data).await?;
        debug!(receipt_id = %receipt.receipt_id, path = %path.display(), "receipt saved to file");
        Ok(())
    }

    async fn get(&self, id: &ReceiptId) -> ComplianceResult<Option<PolicyReceipt>> {
        match fs::read(self.receipt_path(id)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_by_agent(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> ComplianceResult<Vec<PolicyReceipt>> {
        let matching = self
            .load_all()
            .await?
            .into_iter()
            .filter(|receipt| receipt.agent_id == agent_id)
            .collect();
        Ok(newest_first(matching, limit))
    }

    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<Vec<PolicyReceipt>> {
        let matching = self
            .load_all()
            .await?
            .into_iter()
            .filter(|receipt| start <= receipt.timestamp && receipt.timestamp <= end)
            .collect();
        Ok(oldest_first(matching))
    }

    async fn delete(&self, id: &ReceiptId) -> ComplianceResult<bool> {
        match fs::remove_file(self.receipt_path(id)).await {
            Ok(()) => {
                debug!(receipt_id = %id, "receipt deleted");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> ComplianceResult<usize> {
        Ok(self.receipt_files().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use warden_policy::{Decision, EvaluationRequest, EvaluationResult};

    use crate::receipt::ReceiptGenerator;

    fn receipt_at(
        generator: &ReceiptGenerator,
        agent: &str,
        timestamp: DateTime<Utc>,
    ) -> PolicyReceipt {
        let request = EvaluationRequest::new(agent, "read").with_field("id", 1);
        let result = EvaluationResult::new(Decision::Allow, "ok", request.payload().clone())
            .with_timestamp(timestamp);
        generator.create_receipt(&result, &request, &["baseline".to_owned()])
    }

    async fn exercise_store(store: &dyn ReceiptStore) {
        let generator = ReceiptGenerator::new("store-key").unwrap();
        let base = Utc::now();
        let old = receipt_at(&generator, "alpha", base - Duration::hours(2));
        let mid = receipt_at(&generator, "alpha", base - Duration::hours(1));
        let new = receipt_at(&generator, "alpha", base);
        let other = receipt_at(&generator, "beta", base - Duration::minutes(30));

        for receipt in [&mid, &other, &new, &old] {
            store.save(receipt).await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 4);

        let fetched = store.get(&mid.receipt_id).await.unwrap().unwrap();
        assert_eq!(fetched, mid);
        assert!(generator.verify(&fetched));
        assert!(store.get(&ReceiptId::issue()).await.unwrap().is_none());
        assert_eq!(store.require(&new.receipt_id).await.unwrap(), new);
        let missing = ReceiptId::issue();
        assert!(matches!(
            store.require(&missing).await,
            Err(ComplianceError::NotFound(id)) if id == missing
        ));

        let by_agent = store.list_by_agent("alpha", 2).await.unwrap();
        let ids: Vec<ReceiptId> = by_agent.iter().map(|r| r.receipt_id).collect();
        assert_eq!(ids, [new.receipt_id, mid.receipt_id]);

        let ranged = store
            .list_by_date_range(old.timestamp, mid.timestamp)
            .await
            .unwrap();
        let ids: Vec<ReceiptId> = ranged.iter().map(|r| r.receipt_id).collect();
        assert_eq!(ids, [old.receipt_id, mid.receipt_id]);

        assert!(store.delete(&other.receipt_id).await.unwrap());
        assert!(!store.delete(&other.receipt_id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn memory_store_contract() {
        let store = MemoryReceiptStore::new();
        exercise_store(&store).await;
        store.clear().await;
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReceiptStore::open(dir.path().join("receipts")).await.unwrap();
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn file_store_writes_pretty_json_named_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReceiptStore::open(dir.path()).await.unwrap();
        let generator = ReceiptGenerator::new("k").unwrap();
        let receipt = receipt_at(&generator, "gamma", Utc::now());
        store.save(&receipt).await.unwrap();

        let path = dir.path().join(format!("{}.json", receipt.receipt_id));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["agent_id"], json!("gamma"));
        assert_eq!(value["decision"], json!("allow"));
    }

    #[tokio::test]
    async fn file_store_skips_corrupt_files_when_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReceiptStore::open(dir.path()).await.unwrap();
        let generator = ReceiptGenerator::new("k").unwrap();
        let receipt = receipt_at(&generator, "delta", Utc::now());
        store.save(&receipt).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list_by_agent("delta", 100).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
