//! 集成测试共用的内存表格与假 LLM

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use sheet_ai_webhook::error::{ProcessingError, StoreError};
use sheet_ai_webhook::infrastructure::SheetsBackend;
use sheet_ai_webhook::models::{A1Range, CellWrite};
use sheet_ai_webhook::services::TextProcessor;
use sheet_ai_webhook::{router, AppState, Config};

pub const SECRET: &str = "test-secret";

/// 内存表格，记录所有读写调用
pub struct MemorySheet {
    grid: Mutex<Vec<Vec<String>>>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<Vec<CellWrite>>>,
    fail_writes: bool,
}

impl MemorySheet {
    pub fn new(rows: &[&[&str]]) -> Arc<Self> {
        Arc::new(Self::build(rows, false))
    }

    pub fn failing(rows: &[&[&str]]) -> Arc<Self> {
        Arc::new(Self::build(rows, true))
    }

    fn build(rows: &[&[&str]], fail_writes: bool) -> Self {
        Self {
            grid: Mutex::new(
                rows.iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            ),
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            fail_writes,
        }
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Vec<CellWrite>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.reads.lock().unwrap().len() + self.writes.lock().unwrap().len()
    }

    /// 行号 1 始，列号 0 始
    pub fn cell(&self, row: usize, column: usize) -> String {
        self.grid
            .lock()
            .unwrap()
            .get(row - 1)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SheetsBackend for MemorySheet {
    async fn read_range(
        &self,
        _spreadsheet_id: &str,
        range: &A1Range,
    ) -> Result<Vec<Vec<Value>>, StoreError> {
        self.reads.lock().unwrap().push(range.to_string());
        let grid = self.grid.lock().unwrap();

        let cell = |s: &String| {
            if s.is_empty() {
                Vec::new()
            } else {
                vec![Value::from(s.as_str())]
            }
        };

        let mut rows: Vec<Vec<Value>> = match range {
            A1Range::Row { row, .. } => grid
                .get(row - 1)
                .map(|r| vec![r.iter().map(|c| Value::from(c.as_str())).collect()])
                .unwrap_or_default(),
            A1Range::Column { column, .. } => grid
                .iter()
                .map(|r| r.get(*column).map(cell).unwrap_or_default())
                .collect(),
            A1Range::Cell { column, row, .. } => grid
                .get(row - 1)
                .and_then(|r| r.get(*column))
                .map(|c| vec![cell(c)])
                .unwrap_or_default(),
        };
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn batch_write(
        &self,
        _spreadsheet_id: &str,
        writes: &[CellWrite],
    ) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(writes.to_vec());
        if self.fail_writes {
            return Err(StoreError::BadStatus {
                operation: "values.batchUpdate",
                status: 429,
                message: "quota exceeded".into(),
            });
        }

        let mut grid = self.grid.lock().unwrap();
        for write in writes {
            if let A1Range::Cell { column, row, .. } = write.range {
                let cells = &mut grid[row - 1];
                if cells.len() <= column {
                    cells.resize(column + 1, String::new());
                }
                cells[column] = write.value.clone();
            }
        }
        Ok(())
    }
}

/// 假 LLM：记录输入的提示词，返回固定结果
pub struct ScriptedProcessor {
    reply: Result<String, ()>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProcessor {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProcessor for ScriptedProcessor {
    async fn process(&self, text: &str) -> Result<String, ProcessingError> {
        self.calls.lock().unwrap().push(text.to_string());
        self.reply
            .clone()
            .map_err(|_| ProcessingError::Timeout {
                model: "scripted".into(),
                secs: 60,
            })
    }
}

pub fn config() -> Config {
    Config {
        project_id: "demo".into(),
        spreadsheet_id: "spreadsheet-1".into(),
        sheet_name: "Sheet1".into(),
        pk_column: "id".into(),
        target_column: "text".into(),
        result_column: "result".into(),
        webhook_secret: SECRET.into(),
        ..Config::default()
    }
}

pub fn app(sheet: Arc<MemorySheet>, processor: Arc<ScriptedProcessor>) -> axum::Router {
    router(AppState::new(&config(), sheet, processor))
}

/// 表头 + 三行数据，id=42 在第 3 行
pub const SAMPLE_ROWS: &[&[&str]] = &[
    &["id", "text", "result", "processed_at"],
    &["41", "first", "", ""],
    &["42", "second", "", ""],
    &["43", "third", "", ""],
];
