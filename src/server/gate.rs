//! 请求入口校验
//!
//! 先校验共享密钥，再解析请求体。任何一步失败都不会触达表格和 LLM。

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::Config;
use crate::error::GateError;
use crate::models::cell_text;
use crate::workflow::ProcessRequest;

/// 共享密钥请求头
pub const SECRET_HEADER: &str = "x-shared-secret";

pub struct RequestGate {
    secret: String,
    pk_field: String,
    target_field: String,
}

impl RequestGate {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            pk_field: config.pk_column.clone(),
            target_field: config.target_column.clone(),
        }
    }

    /// 校验共享密钥（常量时间比较）
    pub fn verify_secret(&self, headers: &HeaderMap) -> Result<(), GateError> {
        let provided = headers.get(SECRET_HEADER).ok_or_else(|| {
            warn!("请求缺少 {} 请求头", SECRET_HEADER);
            GateError::MissingSecret
        })?;

        let matches: bool = provided
            .as_bytes()
            .ct_eq(self.secret.as_bytes())
            .into();
        if !matches {
            warn!("{} 校验失败", SECRET_HEADER);
            return Err(GateError::InvalidSecret);
        }

        Ok(())
    }

    /// 解析请求体并检查必填字段
    pub fn parse_body(&self, body: &[u8]) -> Result<ProcessRequest, GateError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(GateError::EmptyBody);
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|e| GateError::InvalidJson(e.to_string()))?;
        let Value::Object(mut data) = value else {
            return Err(GateError::InvalidJson("请求体必须是 JSON 对象".to_string()));
        };

        if data.is_empty() {
            return Err(GateError::EmptyBody);
        }

        let missing = self.missing_fields(&data);
        if !missing.is_empty() {
            return Err(GateError::MissingFields(missing));
        }

        let row_id = data.remove(&self.pk_field).unwrap_or(Value::Null);
        let target_text = data
            .get(&self.target_field)
            .map(cell_text)
            .unwrap_or_default();

        Ok(ProcessRequest {
            row_id,
            target_text,
        })
    }

    fn missing_fields(&self, data: &Map<String, Value>) -> Vec<String> {
        [&self.pk_field, &self.target_field]
            .into_iter()
            .filter(|field| !data.contains_key(field.as_str()))
            .cloned()
            .collect()
    }
}
