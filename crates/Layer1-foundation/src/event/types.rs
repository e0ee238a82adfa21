//! 이벤트 타입 정의

/// Broadcast Hub로 전달되는 이벤트
///
/// 이벤트는 Observer 수만큼 복제되므로 `Clone`이 필요합니다.
pub trait HubEvent: Clone + Send + Sync + 'static {
    /// 이벤트 종류 (로그용)
    fn kind(&self) -> &'static str;
}
