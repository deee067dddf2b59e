//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，供配置管理器覆盖文件配置使用

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅当变量确实被设置时返回值，不回落到默认值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MLANG_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 过滤器相关环境变量
pub mod filter {
    use super::*;

    /// 标记词
    pub struct MarkerToken;
    impl EnvVar<String> for MarkerToken {
        const NAME: &'static str = "MLANG_MARKER_TOKEN";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "Substring marking a text fragment as needing remote filtering (case-insensitive)";

        fn parse(value: &str) -> EnvResult<String> {
            let token = value.trim();
            if token.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Marker token cannot be empty".to_string(),
                });
            }
            Ok(token.to_string())
        }
    }

    /// 队列重试间隔
    pub struct RetryDelay;
    impl EnvVar<Duration> for RetryDelay {
        const NAME: &'static str = "MLANG_RETRY_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(500));
        const DESCRIPTION: &'static str = "Delay between queue drain attempts in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_u64_in_range(value, Self::NAME, 1, 60_000)?;
            Ok(Duration::from_millis(millis))
        }
    }

    /// 远程调用超时
    pub struct ExchangeTimeout;
    impl EnvVar<Duration> for ExchangeTimeout {
        const NAME: &'static str = "MLANG_EXCHANGE_TIMEOUT_SECS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str =
            "Timeout for one remote filter call in seconds (unset: no timeout)";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_u64_in_range(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds))
        }
    }

    /// 失败批次重新排队
    pub struct RequeueOnFailure;
    impl EnvVar<bool> for RequeueOnFailure {
        const NAME: &'static str = "MLANG_REQUEUE_ON_FAILURE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str =
            "Re-queue the triggers of a failed cycle instead of dropping them";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 远程方法名
    pub struct MethodName;
    impl EnvVar<String> for MethodName {
        const NAME: &'static str = "MLANG_METHOD_NAME";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("filter_multilang2".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Remote procedure name used for filter requests";

        fn parse(value: &str) -> EnvResult<String> {
            let name = value.trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Method name must be non-empty [A-Za-z0-9_]".to_string(),
                });
            }
            Ok(name.to_string())
        }
    }
}

/// AJAX 端点相关环境变量
pub mod ajax {
    use super::*;

    /// 站点根地址
    pub struct WwwRoot;
    impl EnvVar<String> for WwwRoot {
        const NAME: &'static str = "MLANG_WWWROOT";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Site root URL hosting lib/ajax/service.php";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Site root must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 会话密钥
    pub struct SessKey;
    impl EnvVar<String> for SessKey {
        const NAME: &'static str = "MLANG_SESSKEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Session key appended to AJAX requests";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }
}

/// 解析布尔值
pub fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid boolean '{}'. Use: true/false, 1/0, yes/no, on/off", value),
        }),
    }
}

/// 解析有范围限制的整数
pub fn parse_u64_in_range(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let number: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive integer".to_string(),
    })?;

    if number < min || number > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} out of range [{}, {}]", number, min, max),
        });
    }

    Ok(number)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Filter Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"mlang\")\n",
        filter::MarkerToken::NAME,
        filter::MarkerToken::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        filter::RetryDelay::NAME,
        filter::RetryDelay::DESCRIPTION,
        filter::RetryDelay::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        filter::ExchangeTimeout::NAME,
        filter::ExchangeTimeout::DESCRIPTION,
        filter::ExchangeTimeout::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        filter::RequeueOnFailure::NAME,
        filter::RequeueOnFailure::DESCRIPTION,
        filter::RequeueOnFailure::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: \"filter_multilang2\")\n",
        filter::MethodName::NAME,
        filter::MethodName::DESCRIPTION
    ));

    docs.push_str("\n## AJAX Endpoint\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        ajax::WwwRoot::NAME,
        ajax::WwwRoot::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        ajax::SessKey::NAME,
        ajax::SessKey::DESCRIPTION
    ));

    docs
}
