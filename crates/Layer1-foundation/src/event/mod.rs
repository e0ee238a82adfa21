//! Event system for Helm
//!
//! - `types`: 이벤트 trait (HubEvent)
//! - `hub`: Observer 등록/해제, 이벤트 브로드캐스트 (BroadcastHub)

mod hub;
mod types;

pub use hub::{BroadcastHub, Observer, ObserverId, ObserverReceiver};
pub use types::HubEvent;
