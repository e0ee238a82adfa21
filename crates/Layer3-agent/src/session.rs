//! Session Store - 히스토리 스냅샷 저장소
//!
//! 런타임은 턴이 끝날 때마다, 그리고 load/clear 직후에 전체 히스토리를 넘깁니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helm_foundation::{JsonStore, Result};
use helm_provider::Message;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 세션 저장소 trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 히스토리 스냅샷 저장 (덮어쓰기)
    async fn save(&self, session_id: &str, history: &[Message]) -> Result<()>;

    /// 저장된 히스토리 (없으면 None)
    async fn load(&self, session_id: &str) -> Result<Option<Vec<Message>>>;

    /// 저장된 세션 ID 목록
    async fn list(&self) -> Result<Vec<String>>;

    /// 세션 삭제
    async fn delete(&self, session_id: &str) -> Result<()>;
}

// ============================================================================
// MemorySessionStore
// ============================================================================

/// 메모리 세션 저장소 (테스트, 일회성 실행용)
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session_id: &str, history: &[Message]) -> Result<()> {
        self.sessions
            .write()
            .insert(session_id.to_string(), history.to_vec());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }
}

// ============================================================================
// JsonSessionStore
// ============================================================================

/// 세션 디렉토리
const SESSIONS_DIR: &str = "sessions";

/// 세션 파일 형식
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    id: String,
    updated_at: DateTime<Utc>,
    messages: Vec<Message>,
}

/// JSON 파일 세션 저장소 (`sessions/<id>.json`)
pub struct JsonSessionStore {
    store: JsonStore,
}

impl JsonSessionStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// 전역 설정 디렉토리 (~/.config/helm/sessions)
    pub fn global() -> Result<Self> {
        Ok(Self::new(JsonStore::global()?))
    }

    fn filename(session_id: &str) -> String {
        format!("{}/{}.json", SESSIONS_DIR, session_id)
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn save(&self, session_id: &str, history: &[Message]) -> Result<()> {
        let file = SessionFile {
            id: session_id.to_string(),
            updated_at: Utc::now(),
            messages: history.to_vec(),
        };
        self.store.save(&Self::filename(session_id), &file)
    }

    async fn load(&self, session_id: &str) -> Result<Option<Vec<Message>>> {
        let file: Option<SessionFile> = self.store.load_optional(&Self::filename(session_id))?;
        Ok(file.map(|f| f.messages))
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.store.list(SESSIONS_DIR)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.store.remove(&Self::filename(session_id))
    }
}

// ============================================================================
// 테스트
// ============================================================================
