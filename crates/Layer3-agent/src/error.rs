//! Runtime façade errors

use thiserror::Error;

/// 런타임 호출 거부 사유
///
/// 거부된 호출은 상태를 바꾸지 않습니다.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// 이미 턴이 진행 중
    #[error("A turn is already in progress")]
    Busy,

    /// 턴 진행 중에는 히스토리를 바꿀 수 없음
    #[error("History cannot be replaced while a turn is active")]
    TurnActive,
}
