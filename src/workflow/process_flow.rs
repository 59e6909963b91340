//! 单次请求处理流程 - 流程层
//!
//! 流程顺序：
//! 1. 解析主键列、结果列并定位行
//! 2. 调用 LLM 处理文本
//! 3. 批量写入结果和处理时间

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{cell_text, SheetRef};
use crate::services::{RowUpdater, TextProcessor};
use crate::utils::truncate_text;
use crate::workflow::RowCtx;

/// 处理时间格式（UTC）
pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 经过入口校验的请求
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// 原样保留，用于响应
    pub row_id: Value,
    pub target_text: String,
}

/// 处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub row_id: Value,
    pub ai_result: String,
    pub processed_at: String,
}

/// 请求处理流程
///
/// - 只依赖业务能力（services）
/// - 不持有 HTTP 相关的任何东西
/// - 任何一步失败都立即返回，不重试
pub struct ProcessFlow {
    sheet: SheetRef,
    pk_column: String,
    result_column: String,
    updater: RowUpdater,
    processor: Arc<dyn TextProcessor>,
}

impl ProcessFlow {
    pub fn new(config: &Config, updater: RowUpdater, processor: Arc<dyn TextProcessor>) -> Self {
        Self {
            sheet: SheetRef::new(&config.spreadsheet_id, &config.sheet_name),
            pk_column: config.pk_column.clone(),
            result_column: config.result_column.clone(),
            updater,
            processor,
        }
    }

    pub async fn run(&self, request: &ProcessRequest) -> AppResult<ProcessOutcome> {
        let pk_value = cell_text(&request.row_id);
        let ctx = RowCtx::new(&pk_value);

        info!(
            "{} 处理开始: {}",
            ctx,
            truncate_text(&request.target_text, 40)
        );

        // ========== 1. 定位目标行 ==========
        let target = self
            .updater
            .locate_target(&self.sheet, &self.pk_column, &pk_value, &self.result_column)
            .await
            .inspect_err(|e| warn!("{} 定位失败: {}", ctx, e))?;

        info!("{} ✓ 目标行: 第 {} 行", ctx, target.row);

        // ========== 2. LLM 处理 ==========
        let ai_result = self
            .processor
            .process(&request.target_text)
            .await
            .inspect_err(|e| warn!("{} LLM 处理失败: {}", ctx, e))?;

        let processed_at = Utc::now().format(PROCESSED_AT_FORMAT).to_string();

        // ========== 3. 写回表格 ==========
        self.updater
            .write(&self.sheet, &target, &ai_result, &processed_at)
            .await
            .inspect_err(|e| warn!("{} 表格写入失败: {}", ctx, e))?;

        info!("{} ✅ 处理完成", ctx);

        Ok(ProcessOutcome {
            row_id: request.row_id.clone(),
            ai_result,
            processed_at,
        })
    }
}
