//! Storage module for Helm
//!
//! - `json`: JSON - 범용 파일 저장/로드 (권한, 세션, 런타임 설정)

mod json;

// JSON Storage (범용)
pub use json::JsonStore;
