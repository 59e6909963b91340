//! Sheets API 客户端 - 基础设施层
//!
//! 只暴露"读区域 / 批量写"两种能力，不认识主键、列名等业务概念

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::StoreError;
use crate::infrastructure::token::TokenSource;
use crate::models::{A1Range, CellWrite};

/// 表格存储能力
///
/// 进程内只创建一次，所有请求共享
#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// 读取区域，返回按行排列的单元格值
    ///
    /// 空行返回空数组，末尾的空行会被省略
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
    ) -> Result<Vec<Vec<Value>>, StoreError>;

    /// 一次请求写入多个区域，值按原样写入（不解析公式）
    async fn batch_write(&self, spreadsheet_id: &str, writes: &[CellWrite])
        -> Result<(), StoreError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'static str,
    data: Vec<BatchUpdateEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateEntry<'a> {
    range: String,
    values: [[&'a str; 1]; 1],
}

impl<'a> BatchUpdateRequest<'a> {
    fn raw(writes: &'a [CellWrite]) -> Self {
        Self {
            value_input_option: "RAW",
            data: writes
                .iter()
                .map(|w| BatchUpdateEntry {
                    range: w.range.to_string(),
                    values: [[w.value.as_str()]],
                })
                .collect(),
        }
    }
}

/// Sheets v4 REST 客户端
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// 拼接 `{base}/v4/spreadsheets/{id}/{tail...}`，每段单独转义
    fn endpoint(&self, spreadsheet_id: &str, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id])
            .extend(tail);
        Ok(url)
    }

    async fn check_status(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::BadStatus {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SheetsBackend for SheetsClient {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
    ) -> Result<Vec<Vec<Value>>, StoreError> {
        const OPERATION: &str = "values.get";

        let a1 = range.to_string();
        let url = self.endpoint(spreadsheet_id, &["values", a1.as_str()])?;
        let token = self.tokens.access_token().await?;

        debug!("读取区域: {}", a1);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| StoreError::Request {
                operation: OPERATION,
                source,
            })?;

        let body: ValueRange = Self::check_status(OPERATION, response)
            .await?
            .json()
            .await
            .map_err(|source| StoreError::MalformedResponse {
                operation: OPERATION,
                source,
            })?;

        debug!("区域 {} 返回 {} 行", a1, body.values.len());

        Ok(body.values)
    }

    async fn batch_write(
        &self,
        spreadsheet_id: &str,
        writes: &[CellWrite],
    ) -> Result<(), StoreError> {
        const OPERATION: &str = "values.batchUpdate";

        let url = self.endpoint(spreadsheet_id, &["values:batchUpdate"])?;
        let token = self.tokens.access_token().await?;

        debug!("批量写入 {} 个区域", writes.len());

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&BatchUpdateRequest::raw(writes))
            .send()
            .await
            .map_err(|source| StoreError::Request {
                operation: OPERATION,
                source,
            })?;

        Self::check_status(OPERATION, response).await?;

        Ok(())
    }
}
