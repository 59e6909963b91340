//! 基础设施层
//!
//! 持有外部资源（HTTP 客户端、访问令牌），只暴露能力

pub mod sheets_client;
pub mod token;

pub use sheets_client::{SheetsBackend, SheetsClient};
pub use token::{MetadataToken, StaticToken, TokenSource};
