//! 主键定位 - 业务能力层
//!
//! 扫描主键列，返回第一条匹配的行号（1 始）

use std::sync::Arc;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::SheetsBackend;
use crate::models::{cell_text, A1Range, SheetRef};

/// 主键定位
///
/// - 读取整列，不限制行数
/// - 两侧都转成字符串再比较，`7` 与 `"7"` 视为相等
/// - 不检查主键唯一性，多行同键时返回最上面的一行
/// - 默认跳过表头行（第 1 行），`including_header` 可恢复为包含表头的扫描
#[derive(Clone)]
pub struct RowLocator {
    backend: Arc<dyn SheetsBackend>,
    include_header: bool,
}

impl RowLocator {
    pub fn new(backend: Arc<dyn SheetsBackend>) -> Self {
        Self {
            backend,
            include_header: false,
        }
    }

    /// 表头行也参与匹配
    pub fn including_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// 返回行号（1 始），找不到时返回 `None`
    pub async fn locate(
        &self,
        sheet: &SheetRef,
        pk_column: usize,
        pk_value: &str,
    ) -> AppResult<Option<usize>> {
        let range = A1Range::column(&sheet.sheet_name, pk_column);
        let rows = self
            .backend
            .read_range(&sheet.spreadsheet_id, &range)
            .await?;

        let skip = if self.include_header { 0 } else { 1 };

        let found = rows
            .iter()
            .enumerate()
            .skip(skip)
            .find(|(_, row)| row.first().is_some_and(|cell| cell_text(cell) == pk_value))
            .map(|(index, _)| index + 1);

        match found {
            Some(row) => debug!("主键 '{}' 位于第 {} 行", pk_value, row),
            None => debug!(
                "主键 '{}' 在 {} 中不存在 (扫描 {} 行)",
                pk_value,
                range,
                rows.len()
            ),
        }

        Ok(found)
    }
}
