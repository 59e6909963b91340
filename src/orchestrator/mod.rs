//! 编排层（Orchestration Layer）
//!
//! 负责进程生命周期：构造共享资源、启动 HTTP 服务、优雅退出。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (进程生命周期)
//!     ↓
//! server (HTTP：RequestGate + 路由)
//!     ↓
//! workflow::ProcessFlow (处理单个请求)
//!     ↓
//! services (能力层：列解析 / 行定位 / 行更新 / 文本处理)
//!     ↓
//! infrastructure (基础设施：SheetsClient / TokenSource)
//! ```

pub mod app;

pub use app::App;
