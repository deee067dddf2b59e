//! 过滤器配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, FilterConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 调度相关
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

    // 内容匹配
    pub const DEFAULT_MARKER_TOKEN: &str = "mlang";

    // 远程调用
    pub const DEFAULT_METHOD_NAME: &str = "filter_multilang2";
    pub const AJAX_SERVICE_PATH: &str = "lib/ajax/service.php";

    // 排除区域：不可渲染元素、资源、输入控件、可编辑区域、预格式化内容、手动忽略
    pub const EXCLUDE_SELECTORS: &[&str] = &[
        "script", "noscript", "head", "style",
        "img", "video", "audio", "canvas", "svg", "object", "embed", "iframe", "link", "source",
        "input", "textarea", "[data-fieldtype=\"textarea\"]", "[data-fieldtype=\"editor\"]",
        "[contenteditable=\"true\"]",
        "code", "pre",
        ".ignore-multilang",
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "mlang-filter.toml",
        ".mlang-filter.toml",
        "~/.config/mlang-filter/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}
