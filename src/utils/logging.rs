//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先，否则使用配置中的 `log_level`
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 把 `LOG_LEVEL` 的写法转换为过滤指令
///
/// 兼容 `WARNING` / `CRITICAL` 这类写法
fn filter_directive(log_level: &str) -> String {
    let level = match log_level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    };
    format!("{level},hyper=warn,reqwest=warn")
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 服务启动 - version={}", env!("CARGO_PKG_VERSION"));
    info!("📄 目标表格: {}/{}", config.spreadsheet_id, config.sheet_name);
    info!(
        "🔑 主键列: {} | 文本字段: {} | 结果列: {}",
        config.pk_column, config.target_column, config.result_column
    );
    info!("🤖 LLM 模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 日志里只保留前 `max_chars` 个字符，被截断时追加 `...`
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
