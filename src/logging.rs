//! 日志初始化
//!
//! 库本身只通过 `tracing` 宏输出日志，是否安装订阅者由宿主决定。宿主没有
//! 自己的订阅者时可以调用 [`init_logging`]。

use tracing::Level;

use crate::env::{self, EnvVar};

/// 按环境变量安装全局 `fmt` 订阅者
///
/// - `MLANG_LOG_LEVEL`：最大日志级别，默认 `info`
/// - `NO_COLOR`：设置后禁用 ANSI 颜色
///
/// 已有全局订阅者时返回 `false`，不会覆盖。
pub fn init_logging() -> bool {
    let level = env::core::LogLevel::get().unwrap_or_else(|e| {
        eprintln!("警告: {}，使用 info 级别", e);
        "info".to_string()
    });
    let no_color = env::core::NoColor::get_or_default(false);

    tracing_subscriber::fmt()
        .with_max_level(parse_level(&level))
        .with_ansi(!no_color)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// 解析日志级别，无法识别时为 `INFO`
pub fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
