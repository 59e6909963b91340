//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HTTP 客户端、令牌来源、Sheets 客户端、LLM 服务
//! 2. **资源管理**：所有客户端只创建一次，通过 `AppState` 注入各请求
//! 3. **运行服务**：绑定端口，收到 Ctrl-C / SIGTERM 后优雅退出

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::infrastructure::{MetadataToken, SheetsBackend, SheetsClient, StaticToken, TokenSource};
use crate::server::{self, AppState};
use crate::services::{LlmService, TextProcessor};
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.sheets_timeout_secs))
            .build()
            .context("创建 HTTP 客户端失败")?;

        // 元数据服务器令牌在 Sheets 与 LLM 之间共享
        let metadata: Arc<dyn TokenSource> = Arc::new(MetadataToken::new(http.clone()));

        let sheets_tokens = match &config.sheets_access_token {
            Some(token) => {
                info!("🔑 Sheets API 使用配置的访问令牌");
                Arc::new(StaticToken::new(token)) as Arc<dyn TokenSource>
            }
            None => metadata.clone(),
        };
        let llm_credentials = match &config.llm_api_key {
            Some(key) => Arc::new(StaticToken::new(key)) as Arc<dyn TokenSource>,
            None => metadata,
        };

        let backend: Arc<dyn SheetsBackend> = Arc::new(SheetsClient::new(
            http,
            config.sheets_api_base_url.clone(),
            sheets_tokens,
        ));
        let processor: Arc<dyn TextProcessor> =
            Arc::new(LlmService::new(&config, llm_credentials));

        let state = AppState::new(&config, backend, processor);

        Ok(Self { config, state })
    }

    /// 运行 HTTP 服务，直到收到退出信号
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法绑定地址 {}", addr))?;

        info!("🌐 监听 http://{}", addr);

        axum::serve(listener, server::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到退出信号，正在关闭服务...");
}
