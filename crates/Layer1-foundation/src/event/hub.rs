//! Broadcast Hub - 이벤트 브로드캐스트 시스템
//!
//! 등록된 모든 Observer에게 이벤트를 한 번씩 전달합니다.
//! Observer마다 독립된 unbounded 큐를 가지므로 느린 Observer가
//! 다른 Observer나 발행자를 막지 않습니다.

use super::types::HubEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

// ============================================================================
// Observer
// ============================================================================

/// Observer ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Observer trait
///
/// 이벤트를 수신하는 표면(UI, 로거 등)이 구현합니다.
/// 각 Observer는 전용 전달 태스크에서 순서대로 호출됩니다.
#[async_trait]
pub trait Observer<E>: Send + Sync {
    /// Observer 이름 (디버깅용)
    fn name(&self) -> &str;

    /// 이벤트 처리
    async fn on_event(&self, event: &E);
}

/// Observer 수신 채널
pub type ObserverReceiver<E> = mpsc::UnboundedReceiver<E>;

struct ObserverEntry<E> {
    name: String,
    sender: mpsc::UnboundedSender<E>,
}

// ============================================================================
// BroadcastHub
// ============================================================================

/// Broadcast Hub
pub struct BroadcastHub<E: HubEvent> {
    observers: RwLock<HashMap<ObserverId, ObserverEntry<E>>>,
    next_id: AtomicU64,
}

impl<E: HubEvent> BroadcastHub<E> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 채널 Observer 등록
    ///
    /// 등록 이후 발행된 이벤트만 받습니다 (replay 없음).
    pub fn subscribe(&self, name: impl Into<String>) -> (ObserverId, ObserverReceiver<E>) {
        let id = ObserverId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let name = name.into();
        let (sender, receiver) = mpsc::unbounded_channel();

        debug!(observer_id = %id, name = %name, "Observer attached");
        self.observers
            .write()
            .insert(id, ObserverEntry { name, sender });

        (id, receiver)
    }

    /// trait Observer 등록
    ///
    /// 전용 전달 태스크를 띄우므로 tokio 런타임 안에서 호출해야 합니다.
    pub fn attach(&self, observer: Arc<dyn Observer<E>>) -> ObserverId {
        let (id, mut receiver) = self.subscribe(observer.name());

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                observer.on_event(&event).await;
            }
            trace!(observer_id = %id, "Observer delivery task finished");
        });

        id
    }

    /// Observer 해제 (등록되지 않은 ID면 false)
    pub fn detach(&self, id: ObserverId) -> bool {
        let removed = self.observers.write().remove(&id);
        if let Some(entry) = &removed {
            debug!(observer_id = %id, name = %entry.name, "Observer detached");
        }
        removed.is_some()
    }

    /// 이벤트 발행
    ///
    /// 전달된 Observer 수를 반환합니다. 수신 측이 닫힌 Observer는 제거됩니다.
    pub fn publish(&self, event: E) -> usize {
        let mut closed = Vec::new();
        let mut delivered = 0;

        {
            let observers = self.observers.read();
            for (id, entry) in observers.iter() {
                if entry.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut observers = self.observers.write();
            for id in closed {
                observers.remove(&id);
                debug!(observer_id = %id, "Pruned closed observer");
            }
        }

        trace!(kind = event.kind(), delivered, "Event published");
        delivered
    }

    /// 등록된 Observer 수
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// 등록 여부
    pub fn is_attached(&self, id: ObserverId) -> bool {
        self.observers.read().contains_key(&id)
    }
}

impl<E: HubEvent> Default for BroadcastHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================
