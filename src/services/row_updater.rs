//! 行更新 - 业务能力层
//!
//! 把结果和处理时间写回主键对应的行

use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::SheetsBackend;
use crate::models::{column_letter, A1Range, CellWrite, SheetRef};
use crate::services::{ColumnResolver, RowLocator};

/// 处理时间列相对结果列的偏移
///
/// 表格约定：处理时间列紧挨在结果列右侧，不单独配置
pub const PROCESSED_AT_OFFSET: usize = 1;

/// 待写入的目标位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTarget {
    /// 行号（1 始）
    pub row: usize,
    pub result_column: usize,
    pub processed_at_column: usize,
}

/// 行更新
pub struct RowUpdater {
    backend: Arc<dyn SheetsBackend>,
    resolver: ColumnResolver,
    locator: RowLocator,
}

impl RowUpdater {
    pub fn new(backend: Arc<dyn SheetsBackend>, locator: RowLocator) -> Self {
        Self {
            resolver: ColumnResolver::new(backend.clone()),
            backend,
            locator,
        }
    }

    /// 解析列位置并定位行
    ///
    /// 依次读取两次表头（主键列、结果列），再扫描主键列
    pub async fn locate_target(
        &self,
        sheet: &SheetRef,
        pk_column: &str,
        pk_value: &str,
        result_column: &str,
    ) -> AppResult<UpdateTarget> {
        let pk_position = self.resolver.resolve(sheet, pk_column).await?;
        let result_position = self.resolver.resolve(sheet, result_column).await?;

        let row = self
            .locator
            .locate(sheet, pk_position, pk_value)
            .await?
            .ok_or_else(|| AppError::RowNotFound {
                pk_column: pk_column.to_string(),
                pk_value: pk_value.to_string(),
            })?;

        Ok(UpdateTarget {
            row,
            result_column: result_position,
            processed_at_column: result_position + PROCESSED_AT_OFFSET,
        })
    }

    /// 一次批量请求写入结果和处理时间
    ///
    /// 失败时整体视为未写入，不区分部分成功
    pub async fn write(
        &self,
        sheet: &SheetRef,
        target: &UpdateTarget,
        result_value: &str,
        processed_at: &str,
    ) -> AppResult<()> {
        let writes = [
            CellWrite {
                range: A1Range::cell(&sheet.sheet_name, target.result_column, target.row),
                value: result_value.to_string(),
            },
            CellWrite {
                range: A1Range::cell(&sheet.sheet_name, target.processed_at_column, target.row),
                value: processed_at.to_string(),
            },
        ];

        self.backend
            .batch_write(&sheet.spreadsheet_id, &writes)
            .await?;

        info!(
            "✓ 表格更新完成: 第 {} 行 ({}, {})",
            target.row,
            column_letter(target.result_column),
            column_letter(target.processed_at_column)
        );

        Ok(())
    }

    /// 定位并写入
    pub async fn update(
        &self,
        sheet: &SheetRef,
        pk_column: &str,
        pk_value: &str,
        result_column: &str,
        result_value: &str,
        processed_at: &str,
    ) -> AppResult<()> {
        info!("表格更新开始: pk={}", pk_value);

        let target = self
            .locate_target(sheet, pk_column, pk_value, result_column)
            .await?;
        self.write(sheet, &target, result_value, processed_at).await
    }
}
