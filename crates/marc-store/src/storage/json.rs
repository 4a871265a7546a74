//! Single-document JSON file storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use marc_core::{
    config::STORE_FILE,
    traits::{StateStorage, StorageError, StoreData},
};
use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};

/// Stores the relay state as `store.json` inside a data directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
    file: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage rooted at `data_dir`. The directory is created on first save.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        let file = dir.join(STORE_FILE);
        Self { dir, file }
    }

    /// Path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file
    }
}

/// Whether a raw document predates the `channel` -> `target` rename.
fn is_legacy(doc: &Value) -> bool {
    doc.get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .is_some_and(|first| first.get("channel").is_some())
}

/// Pretty-print with tab indentation, matching documents written by earlier releases.
fn encode(data: &StoreData) -> Result<Vec<u8>, StorageError> {
    let mut out = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    data.serialize(&mut ser)?;
    Ok(out)
}

#[async_trait]
impl StateStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<StoreData>, StorageError> {
        let bytes = match tokio::fs::read(&self.file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let doc: Value = serde_json::from_slice(&bytes)?;
        if is_legacy(&doc) {
            tracing::info!(path = %self.file.display(), "migrating store: channel -> target");
        }

        Ok(Some(serde_json::from_value(doc)?))
    }

    async fn save(&self, data: &StoreData) -> Result<(), StorageError> {
        let bytes = encode(data)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marc_core::{Message, MessageKind};

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested"));
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_creates_directory_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested"));

        let mut data = StoreData::default();
        data.messages
            .push(Message::new(1, "alice", "#general", "hello", 10, MessageKind::Text));
        data.next_id = 2;
        storage.save(&data).await.unwrap();

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        assert!(raw.contains("\n\t\"messages\""));
        assert!(raw.contains("\"nextId\": 2"));

        assert_eq!(storage.load().await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();

        let storage = JsonFileStorage::new(dir.path());
        assert!(matches!(
            storage.load().await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn legacy_document_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = r##"{
            "messages": [
                {"id": 4, "from": "alice", "channel": "#ops", "text": "deploying", "ts": 100}
            ],
            "cursors": {"bob": 90},
            "nextId": 5,
            "shellChannels": ["#sh"]
        }"##;
        std::fs::write(dir.path().join(STORE_FILE), legacy).unwrap();

        let data = JsonFileStorage::new(dir.path()).load().await.unwrap().unwrap();
        assert_eq!(data.messages[0].target, "#ops");
        assert_eq!(data.messages[0].kind, MessageKind::Text);
        assert_eq!(data.cursors.get("bob"), Some(&90));
        assert!(data.joined.is_empty());
        assert_eq!(data.next_id, 5);
    }
}
