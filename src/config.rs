use crate::error::ConfigError;
use serde::Deserialize;
use std::str::FromStr;

/// 程序配置
///
/// 加载顺序：默认值 → `CONFIG_FILE` 指向的 TOML 文件（可选）→ 环境变量。
/// 进程生命周期内不可变。
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    // --- 表格配置（必填）---
    pub project_id: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// 主键列名（同时也是请求体中的主键字段名）
    pub pk_column: String,
    /// 待处理文本的字段名
    pub target_column: String,
    /// 结果列名，处理时间写在其右侧一列
    pub result_column: String,
    /// Webhook 共享密钥
    pub webhook_secret: String,

    // --- LLM 配置 ---
    pub vertex_ai_location: String,
    pub llm_model_name: String,
    /// 为空时根据 project_id / location 推导 Vertex AI 的 OpenAI 兼容地址
    pub llm_api_base_url: Option<String>,
    /// 为空时使用访问令牌
    pub llm_api_key: Option<String>,
    pub llm_max_output_tokens: u32,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,

    // --- Sheets API 配置 ---
    pub sheets_api_base_url: String,
    /// 为空时从元数据服务器获取
    pub sheets_access_token: Option<String>,
    pub sheets_timeout_secs: u64,
    /// 主键扫描是否包含表头行
    pub pk_scan_includes_header: bool,

    // --- 服务配置 ---
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            spreadsheet_id: String::new(),
            sheet_name: String::new(),
            pk_column: String::new(),
            target_column: String::new(),
            result_column: String::new(),
            webhook_secret: String::new(),
            vertex_ai_location: "asia-northeast1".to_string(),
            llm_model_name: "google/gemini-1.5-flash".to_string(),
            llm_api_base_url: None,
            llm_api_key: None,
            llm_max_output_tokens: 2048,
            llm_temperature: 0.2,
            llm_timeout_secs: 60,
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            sheets_access_token: None,
            sheets_timeout_secs: 30,
            pk_scan_includes_header: false,
            log_level: "INFO".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.is_empty() => Self::from_toml_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    /// 用环境变量覆盖当前值
    ///
    /// `lookup` 抽象了环境变量读取，便于测试
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let strings: [(&str, &mut String); 12] = [
            ("PROJECT_ID", &mut self.project_id),
            ("SPREADSHEET_ID", &mut self.spreadsheet_id),
            ("SHEET_NAME", &mut self.sheet_name),
            ("PK_COLUMN", &mut self.pk_column),
            ("TARGET_COLUMN", &mut self.target_column),
            ("RESULT_COLUMN", &mut self.result_column),
            ("WEBHOOK_SECRET", &mut self.webhook_secret),
            ("VERTEX_AI_LOCATION", &mut self.vertex_ai_location),
            ("VERTEX_AI_MODEL", &mut self.llm_model_name),
            ("SHEETS_API_BASE_URL", &mut self.sheets_api_base_url),
            ("LOG_LEVEL", &mut self.log_level),
            ("HOST", &mut self.host),
        ];
        for (name, slot) in strings {
            if let Some(value) = get(name) {
                *slot = value;
            }
        }

        if let Some(value) = get("LLM_API_BASE_URL") {
            self.llm_api_base_url = Some(value);
        }
        if let Some(value) = get("LLM_API_KEY") {
            self.llm_api_key = Some(value);
        }
        if let Some(value) = get("GOOGLE_ACCESS_TOKEN") {
            self.sheets_access_token = Some(value);
        }

        parse_into(&get, "LLM_MAX_OUTPUT_TOKENS", "u32", &mut self.llm_max_output_tokens)?;
        parse_into(&get, "LLM_TEMPERATURE", "f32", &mut self.llm_temperature)?;
        parse_into(&get, "LLM_TIMEOUT_SECS", "u64", &mut self.llm_timeout_secs)?;
        parse_into(&get, "SHEETS_TIMEOUT_SECS", "u64", &mut self.sheets_timeout_secs)?;
        parse_into(&get, "PK_SCAN_INCLUDES_HEADER", "bool", &mut self.pk_scan_includes_header)?;
        parse_into(&get, "PORT", "u16", &mut self.port)?;

        Ok(())
    }

    /// 检查必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("PROJECT_ID", &self.project_id),
            ("SPREADSHEET_ID", &self.spreadsheet_id),
            ("SHEET_NAME", &self.sheet_name),
            ("PK_COLUMN", &self.pk_column),
            ("TARGET_COLUMN", &self.target_column),
            ("RESULT_COLUMN", &self.result_column),
            ("WEBHOOK_SECRET", &self.webhook_secret),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingRequired(missing))
        }
    }

    /// LLM API 地址
    pub fn llm_base_url(&self) -> String {
        match &self.llm_api_base_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/endpoints/openapi",
                location = self.vertex_ai_location,
                project = self.project_id,
            ),
        }
    }
}

fn parse_into<T, G>(
    get: &G,
    var_name: &str,
    expected_type: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(value) = get(var_name) {
        *slot = value
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                var_name: var_name.to_string(),
                value,
                expected_type,
            })?;
    }
    Ok(())
}
