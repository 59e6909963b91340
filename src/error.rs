//! 错误类型
//!
//! 分层：
//! - `GateError` - 请求入口校验（密钥 / 请求体）
//! - `StoreError` - 表格存储（Sheets API）调用失败
//! - `ProcessingError` - 文本生成服务调用失败
//! - `CredentialError` - 访问令牌获取失败
//! - `ConfigError` - 启动配置错误
//!
//! 所有错误最终汇总为 `AppError`，HTTP 层通过 `status_code()` 映射状态码。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求入口校验失败
    #[error("请求校验失败: {0}")]
    Gate(#[from] GateError),

    /// 表头中不存在指定列
    #[error("列 '{column}' 在工作表 '{sheet}' 中不存在")]
    ColumnNotFound { column: String, sheet: String },

    /// 主键列中没有匹配的行
    #[error("主键 '{pk_column}' = '{pk_value}' 没有对应的行")]
    RowNotFound { pk_column: String, pk_value: String },

    /// 表格存储错误
    #[error("表格存储错误: {0}")]
    Store(#[from] StoreError),

    /// 文本处理错误
    #[error("文本处理错误: {0}")]
    Processing(#[from] ProcessingError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Gate(GateError::MissingSecret | GateError::InvalidSecret) => 403,
            AppError::Gate(_) => 400,
            _ => 500,
        }
    }

    /// 返回给调用方的通用错误信息
    ///
    /// 内部细节只写日志，不返回给调用方
    pub fn public_message(&self) -> String {
        match self {
            AppError::Gate(GateError::MissingSecret) => "缺少认证请求头".to_string(),
            AppError::Gate(GateError::InvalidSecret) => "认证失败".to_string(),
            AppError::Gate(GateError::InvalidJson(_)) => "无效的 JSON 格式".to_string(),
            AppError::Gate(GateError::EmptyBody) => "请求体为空".to_string(),
            AppError::Gate(GateError::MissingFields(fields)) => {
                format!("缺少必填字段: {}", fields.join(", "))
            }
            AppError::Processing(_) => "AI 处理过程中发生错误".to_string(),
            AppError::ColumnNotFound { .. } | AppError::RowNotFound { .. } | AppError::Store(_) => {
                "写入表格时发生错误".to_string()
            }
            AppError::Config(_) => "服务配置错误".to_string(),
        }
    }
}

/// 请求入口校验错误
#[derive(Debug, Error)]
pub enum GateError {
    #[error("缺少共享密钥请求头")]
    MissingSecret,

    #[error("共享密钥不匹配")]
    InvalidSecret,

    #[error("请求体不是合法的 JSON 对象: {0}")]
    InvalidJson(String),

    #[error("请求体为空")]
    EmptyBody,

    #[error("缺少必填字段: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// 表格存储（Sheets API）错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 获取访问令牌失败
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// 网络请求失败（含超时）
    #[error("Sheets API 请求失败 ({operation}): {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// API 返回非成功状态码
    #[error("Sheets API 返回错误 ({operation}): status={status}, message={message}")]
    BadStatus {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// 响应体无法解析
    #[error("Sheets API 响应解析失败 ({operation}): {source}")]
    MalformedResponse {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// 请求地址无法构造
    #[error("无效的 Sheets API 地址: {0}")]
    InvalidUrl(String),
}

/// 文本生成服务错误
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// 请求构造失败
    #[error("LLM 请求构造失败: {0}")]
    BuildRequest(#[source] async_openai::error::OpenAIError),

    /// API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },

    /// 调用超时
    #[error("LLM 调用超时 (模型: {model}, {secs} 秒)")]
    Timeout { model: String, secs: u64 },

    /// 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 访问令牌错误
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("访问令牌请求失败: {0}")]
    Request(#[source] reqwest::Error),

    #[error("元数据服务器返回错误: status={status}")]
    BadStatus { status: u16 },

    #[error("访问令牌响应解析失败: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填项缺失
    #[error("缺少必填配置: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },

    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
