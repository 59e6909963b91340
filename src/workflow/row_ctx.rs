//! 行处理上下文
//!
//! 封装"我正在处理哪一行"这一信息，只用于日志

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 主键值（字符串形式）
    pub row_id: String,
}

impl RowCtx {
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 #{}]", self.row_id)
    }
}
