//! A1 表示法
//!
//! 列位置（0 始）与列字母的互相转换，以及 Sheets API 使用的区域地址。

use serde_json::Value;
use std::fmt;

/// 列位置（0 始）转列字母
///
/// 0 → "A"，25 → "Z"，26 → "AA"，701 → "ZZ"
pub fn column_letter(position: usize) -> String {
    let mut letters = Vec::new();
    let mut n = position;
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    // 只包含 A-Z
    String::from_utf8(letters).unwrap_or_default()
}

/// 列字母转列位置（0 始），大小写不敏感
///
/// 空串、非字母或溢出时返回 `None`
pub fn column_position(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// 单元格值转字符串
///
/// 主键比较两侧都先转成字符串，数字与字符串形式的同一个值视为相等
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 工作表定位：表格 ID + 工作表名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetRef {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_id, self.sheet_name)
    }
}

/// 工作表内的区域
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum A1Range {
    /// 整行，例如 `Sheet1!1:1`
    Row { sheet_name: String, row: usize },
    /// 整列，例如 `Sheet1!C:C`
    Column { sheet_name: String, column: usize },
    /// 单个单元格，例如 `Sheet1!C3`
    Cell {
        sheet_name: String,
        column: usize,
        row: usize,
    },
}

impl A1Range {
    pub fn header(sheet_name: &str) -> Self {
        A1Range::Row {
            sheet_name: sheet_name.to_string(),
            row: 1,
        }
    }

    pub fn column(sheet_name: &str, column: usize) -> Self {
        A1Range::Column {
            sheet_name: sheet_name.to_string(),
            column,
        }
    }

    pub fn cell(sheet_name: &str, column: usize, row: usize) -> Self {
        A1Range::Cell {
            sheet_name: sheet_name.to_string(),
            column,
            row,
        }
    }

    pub fn sheet_name(&self) -> &str {
        match self {
            A1Range::Row { sheet_name, .. }
            | A1Range::Column { sheet_name, .. }
            | A1Range::Cell { sheet_name, .. } => sheet_name,
        }
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, self.sheet_name())?;
        match self {
            A1Range::Row { row, .. } => write!(f, "!{row}:{row}"),
            A1Range::Column { column, .. } => {
                let letter = column_letter(*column);
                write!(f, "!{letter}:{letter}")
            }
            A1Range::Cell { column, row, .. } => write!(f, "!{}{}", column_letter(*column), row),
        }
    }
}

/// 非纯标识符的工作表名需要加单引号，内部的单引号写两次
fn write_sheet_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        f.write_str(name)
    } else {
        write!(f, "'{}'", name.replace('\'', "''"))
    }
}

/// 一次单元格写入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub range: A1Range,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_letter_spot_values() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(2), "C");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_column_letter_round_trips() {
        for n in 0..=1000 {
            assert_eq!(column_position(&column_letter(n)), Some(n), "位置 {}", n);
        }
    }

    #[test]
    fn test_column_position_rejects_garbage() {
        assert_eq!(column_position(""), None);
        assert_eq!(column_position("A1"), None);
        assert_eq!(column_position("aa"), Some(26));
    }

    #[test]
    fn test_range_display() {
        assert_eq!(A1Range::header("Sheet1").to_string(), "Sheet1!1:1");
        assert_eq!(A1Range::column("Sheet1", 2).to_string(), "Sheet1!C:C");
        assert_eq!(A1Range::cell("Sheet1", 27, 14).to_string(), "Sheet1!AB14");
    }

    #[test]
    fn test_range_display_quotes_sheet_names() {
        assert_eq!(A1Range::header("Form Responses").to_string(), "'Form Responses'!1:1");
        assert_eq!(A1Range::cell("Bob's", 0, 2).to_string(), "'Bob''s'!A2");
        assert_eq!(A1Range::column("回答", 3).to_string(), "'回答'!D:D");
    }

    #[test]
    fn test_cell_text_coerces_scalars() {
        assert_eq!(cell_text(&json!("7")), "7");
        assert_eq!(cell_text(&json!(7)), "7");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
    }
}
