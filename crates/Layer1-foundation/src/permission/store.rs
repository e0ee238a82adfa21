//! Permission 저장소
//!
//! 기억된 허용 기록(PermissionRecord)의 외부 저장소 인터페이스.
//! 런타임에서는 Permission Gate만 이 저장소에 씁니다.

use super::types::PermissionRecord;
use crate::storage::JsonStore;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// 설정 파일명
pub const PERMISSIONS_FILE: &str = "permissions.json";

/// 권한 기록 저장소
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// 모든 기록 조회
    async fn get_permissions(&self) -> Result<Vec<PermissionRecord>>;

    /// 기록 추가 (이미 있으면 무시)
    async fn add_permission(&self, tool: &str, path: Option<&str>) -> Result<()>;

    /// 기록 제거 (없으면 무시)
    async fn remove_permission(&self, tool: &str, path: Option<&str>) -> Result<()>;

    /// 전체 삭제
    async fn clear_permissions(&self) -> Result<()>;
}

// ============================================================================
// MemoryPermissionStore
// ============================================================================

/// 메모리 저장소 (테스트, 임시 세션용)
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    records: RwLock<BTreeSet<PermissionRecord>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PermissionRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn get_permissions(&self) -> Result<Vec<PermissionRecord>> {
        Ok(self.records.read().iter().cloned().collect())
    }

    async fn add_permission(&self, tool: &str, path: Option<&str>) -> Result<()> {
        self.records
            .write()
            .insert(PermissionRecord::new(tool, path.map(String::from)));
        Ok(())
    }

    async fn remove_permission(&self, tool: &str, path: Option<&str>) -> Result<()> {
        self.records
            .write()
            .remove(&PermissionRecord::new(tool, path.map(String::from)));
        Ok(())
    }

    async fn clear_permissions(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }
}

// ============================================================================
// JsonPermissionStore
// ============================================================================

/// Permission 설정 파일 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSettings {
    /// 영구 허용된 기록들
    #[serde(default)]
    pub grants: BTreeSet<PermissionRecord>,
}

/// JSON 파일 저장소 (`permissions.json`)
///
/// 로드한 내용을 메모리에 캐시하고, 변경 시마다 파일 전체를 다시 씁니다.
#[derive(Debug)]
pub struct JsonPermissionStore {
    store: JsonStore,
    settings: RwLock<PermissionSettings>,
}

impl JsonPermissionStore {
    /// 저장소 열기 (파일이 없으면 빈 설정)
    pub fn open(store: JsonStore) -> Result<Self> {
        let settings = store
            .load_optional::<PermissionSettings>(PERMISSIONS_FILE)?
            .unwrap_or_default();
        debug!(
            path = %store.file_path(PERMISSIONS_FILE).display(),
            grants = settings.grants.len(),
            "Loaded permission records"
        );
        Ok(Self {
            store,
            settings: RwLock::new(settings),
        })
    }

    /// 글로벌 설정 디렉토리의 저장소
    pub fn global() -> Result<Self> {
        Self::open(JsonStore::global()?)
    }

    fn update(&self, f: impl FnOnce(&mut PermissionSettings) -> bool) -> Result<()> {
        let mut settings = self.settings.write();
        if f(&mut settings) {
            self.store.save(PERMISSIONS_FILE, &*settings)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for JsonPermissionStore {
    async fn get_permissions(&self) -> Result<Vec<PermissionRecord>> {
        Ok(self.settings.read().grants.iter().cloned().collect())
    }

    async fn add_permission(&self, tool: &str, path: Option<&str>) -> Result<()> {
        let record = PermissionRecord::new(tool, path.map(String::from));
        self.update(|s| s.grants.insert(record))
    }

    async fn remove_permission(&self, tool: &str, path: Option<&str>) -> Result<()> {
        let record = PermissionRecord::new(tool, path.map(String::from));
        self.update(|s| s.grants.remove(&record))
    }

    async fn clear_permissions(&self) -> Result<()> {
        self.update(|s| {
            let changed = !s.grants.is_empty();
            s.grants.clear();
            changed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryPermissionStore::new();
        store.add_permission("bash", None).await.unwrap();
        store.add_permission("bash", None).await.unwrap();
        store
            .add_permission("write_file", Some("/tmp/x"))
            .await
            .unwrap();
        assert_eq!(store.get_permissions().await.unwrap().len(), 2);

        store.remove_permission("bash", None).await.unwrap();
        assert_eq!(
            store.get_permissions().await.unwrap(),
            vec![PermissionRecord::new("write_file", Some("/tmp/x".into()))]
        );

        store.clear_permissions().await.unwrap();
        assert!(store.get_permissions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_persists() {
        let dir = TempDir::new().unwrap();

        {
            let store = JsonPermissionStore::open(JsonStore::new(dir.path())).unwrap();
            store
                .add_permission("write_file", Some("/tmp/x"))
                .await
                .unwrap();
            store.add_permission("bash", None).await.unwrap();
        }

        let reopened = JsonPermissionStore::open(JsonStore::new(dir.path())).unwrap();
        let records = reopened.get_permissions().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.contains(&PermissionRecord::wildcard("bash")));

        reopened.remove_permission("bash", None).await.unwrap();
        let again = JsonPermissionStore::open(JsonStore::new(dir.path())).unwrap();
        assert_eq!(again.get_permissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_json_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonPermissionStore::open(JsonStore::new(dir.path())).unwrap();
        assert!(store.get_permissions().await.unwrap().is_empty());
        // 변경이 없으면 파일을 만들지 않음
        store.clear_permissions().await.unwrap();
        assert!(!dir.path().join(PERMISSIONS_FILE).exists());
    }
}
