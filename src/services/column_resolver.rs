//! 列名解析 - 业务能力层
//!
//! 读取表头行，把列名映射为列位置

use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::SheetsBackend;
use crate::models::{A1Range, SheetRef};

/// 列名解析
///
/// 每次调用都重新读取表头，不做缓存
#[derive(Clone)]
pub struct ColumnResolver {
    backend: Arc<dyn SheetsBackend>,
}

impl ColumnResolver {
    pub fn new(backend: Arc<dyn SheetsBackend>) -> Self {
        Self { backend }
    }

    /// 返回列名在表头中的位置（0 始）
    ///
    /// 从左到右取第一个完全相等的单元格（区分大小写，不去空格）
    pub async fn resolve(&self, sheet: &SheetRef, column_name: &str) -> AppResult<usize> {
        let rows = self
            .backend
            .read_range(&sheet.spreadsheet_id, &A1Range::header(&sheet.sheet_name))
            .await?;

        let position = rows
            .first()
            .and_then(|header| {
                header
                    .iter()
                    .position(|cell| cell.as_str() == Some(column_name))
            })
            .ok_or_else(|| AppError::ColumnNotFound {
                column: column_name.to_string(),
                sheet: sheet.sheet_name.clone(),
            })?;

        debug!("列 '{}' 位于第 {} 列", column_name, position);

        Ok(position)
    }
}
