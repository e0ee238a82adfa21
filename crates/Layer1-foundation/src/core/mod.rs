//! Core - 도구 실행에 필요한 핵심 Trait 및 타입
//!
//! - `traits`: Tool, ToolContext, ToolMeta
//! - `types`: ToolOutput, ToolError, ImageData

mod traits;
mod types;

pub use traits::{Tool, ToolContext, ToolMeta};
pub use types::{ImageData, ToolError, ToolOutput};
