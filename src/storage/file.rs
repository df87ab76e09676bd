//! 文件存储：单个 JSON 对象文件，键 -> 字符串值
//!
//! 写入时先写临时文件再 rename，避免进程中断留下半截 JSON；父目录不存在时自动创建。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::storage::{StateStorage, StorageError};

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 读取整张表；文件不存在时返回空表
    fn load_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // 表损坏时以空表重建，保证后续写入可用
        let mut map = self.load_map().unwrap_or_else(|e| {
            tracing::warn!("Storage file {} unreadable ({}), rewriting", self.path.display(), e);
            BTreeMap::new()
        });
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn test_set_get_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("nested/dir/storage.json"));
        storage.set("a", "1").unwrap();
        storage.set("b", "{\"x\":2}").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("{\"x\":2}"));

        storage.set("a", "3").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("3"));
        assert!(storage.get("b").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_file_errors_on_read_and_recovers_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();
        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get("k"), Err(StorageError::Corrupt(_))));

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}
