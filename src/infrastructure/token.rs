//! 访问令牌 - 基础设施层
//!
//! Sheets API 与 Vertex AI 共用同一个令牌来源

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::CredentialError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const TOKEN_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets,https://www.googleapis.com/auth/cloud-platform";

/// 提前刷新的余量
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// 访问令牌来源
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// 固定令牌（来自配置）
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// 元数据服务器令牌（Cloud Run / GCE 的服务账号）
///
/// 令牌缓存到过期前 60 秒
pub struct MetadataToken {
    http: reqwest::Client,
    endpoint: String,
    cache: Mutex<Option<CachedToken>>,
}

impl MetadataToken {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: METADATA_TOKEN_URL.to_string(),
            cache: Mutex::new(None),
        }
    }

    /// 替换令牌地址（本地模拟元数据服务器时使用）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch(&self) -> Result<MetadataTokenResponse, CredentialError> {
        debug!("从元数据服务器获取访问令牌");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("scopes", TOKEN_SCOPES)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(CredentialError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::BadStatus {
                status: status.as_u16(),
            });
        }

        response
            .json::<MetadataTokenResponse>()
            .await
            .map_err(CredentialError::Malformed)
    }
}

#[async_trait]
impl TokenSource for MetadataToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        // 刷新期间持有锁，并发请求等待同一次刷新
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        info!("✓ 访问令牌已刷新，有效期 {} 秒", fresh.expires_in);

        *cache = Some(CachedToken {
            token: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(fresh.access_token)
    }
}
