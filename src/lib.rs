//! # Sheet AI Webhook
//!
//! 接收表单工具的 Webhook，把指定字段交给 LLM 处理，再把结果写回表格中对应的行
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端和访问令牌，只暴露能力
//! - `SheetsClient` - Sheets v4 REST：读区域、批量写
//! - `TokenSource` - 固定令牌 / 元数据服务器令牌
//!
//! ### ② 业务能力层（Services）
//! - `ColumnResolver` - 列名 → 列位置（读表头）
//! - `RowLocator` - 主键值 → 行号（扫描主键列）
//! - `RowUpdater` - 结果 + 处理时间，一次批量写入
//! - `LlmService` - 文本进、文本出
//!
//! ### ③ 流程层（Workflow）
//! - `ProcessFlow` - 定位行 → LLM → 写回
//!
//! ### ④ 入口与编排（Server / Orchestration）
//! - `server/` - 共享密钥校验、请求体校验、路由
//! - `orchestrator/` - 构造共享资源、运行服务
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::App;
pub use server::{router, AppState};
pub use workflow::{ProcessFlow, ProcessOutcome, ProcessRequest};
