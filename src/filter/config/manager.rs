//! 简化的配置管理器
//!
//! 提供统一的配置接口，按 `.env` → 配置文件 → 环境变量 的顺序叠加

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::filter::error::{FilterError, FilterResult};
use crate::filter::pipeline::selector::ExclusionRules;

/// 过滤器配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    // 内容匹配
    pub marker_token: String,
    pub exclude_selectors: Vec<String>,

    // 调度
    pub retry_delay_ms: u64,

    // 远程调用
    pub method_name: String,
    pub exchange_timeout_secs: Option<u64>,
    pub requeue_on_failure: bool,

    // AJAX 端点
    pub wwwroot: Option<String>,
    pub sesskey: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            marker_token: constants::DEFAULT_MARKER_TOKEN.to_string(),
            exclude_selectors: constants::EXCLUDE_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY.as_millis() as u64,
            method_name: constants::DEFAULT_METHOD_NAME.to_string(),
            exchange_timeout_secs: None,
            requeue_on_failure: false,
            wwwroot: None,
            sesskey: None,
        }
    }
}

impl FilterConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn exchange_timeout(&self) -> Option<Duration> {
        self.exchange_timeout_secs.map(Duration::from_secs)
    }

    /// 解析排除选择器
    pub fn exclusion_rules(&self) -> FilterResult<ExclusionRules> {
        ExclusionRules::parse_list(&self.exclude_selectors)
    }

    /// 验证配置
    pub fn validate(&self) -> FilterResult<()> {
        if self.marker_token.trim().is_empty() {
            return Err(FilterError::ConfigError("标记词不能为空".to_string()));
        }

        if self.retry_delay_ms == 0 {
            return Err(FilterError::ConfigError("重试间隔必须大于0".to_string()));
        }

        if self.method_name.trim().is_empty() {
            return Err(FilterError::ConfigError("远程方法名不能为空".to_string()));
        }

        if self.exchange_timeout_secs == Some(0) {
            return Err(FilterError::ConfigError("超时时间必须大于0".to_string()));
        }

        self.exclusion_rules()
            .map_err(|e| FilterError::ConfigError(format!("exclude_selectors: {}", e)))?;

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> FilterResult<()> {
        use crate::env::{ajax, filter, EnvVar};

        if let Some(token) = filter::MarkerToken::get_set() {
            self.marker_token = token?;
        }

        if let Some(delay) = filter::RetryDelay::get_set() {
            self.retry_delay_ms = delay?.as_millis() as u64;
        }

        if let Some(timeout) = filter::ExchangeTimeout::get_set() {
            self.exchange_timeout_secs = Some(timeout?.as_secs());
        }

        if let Some(requeue) = filter::RequeueOnFailure::get_set() {
            self.requeue_on_failure = requeue?;
        }

        if let Some(method) = filter::MethodName::get_set() {
            self.method_name = method?;
        }

        if let Some(wwwroot) = ajax::WwwRoot::get_set() {
            self.wwwroot = Some(wwwroot?);
        }

        if let Some(sesskey) = ajax::SessKey::get_set() {
            self.sesskey = Some(sesskey?);
        }

        Ok(())
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: FilterConfig,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn new() -> FilterResult<Self> {
        Self::load_dotenv();

        let mut config = Self::load_config()?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件加载，再叠加环境变量
    pub fn from_file<P: AsRef<Path>>(path: P) -> FilterResult<Self> {
        let mut config = Self::load_from_file(path.as_ref())?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn into_config(self) -> FilterConfig {
        self.config
    }

    fn load_config() -> FilterResult<FilterConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(FilterConfig::default())
    }

    /// 从指定文件加载配置，`.json` 按 JSON 解析，其余按 TOML
    fn load_from_file(path: &Path) -> FilterResult<FilterConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FilterError::ConfigError(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .map_err(|e| FilterError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| FilterError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> FilterResult<()> {
        let content = toml::to_string_pretty(&FilterConfig::default())
            .map_err(|e| FilterError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FilterError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
