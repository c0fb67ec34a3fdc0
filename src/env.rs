//! 统一的环境变量管理
//!
//! 每个变量是一个实现 [`EnvVar`] 的零大小类型，按用途分组。

use std::env;
use std::time::Duration;

use thiserror::Error;

/// 环境变量解析错误
#[derive(Debug, Clone, Error)]
#[error("Environment variable '{variable}': {message}")]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl EnvError {
    fn new(variable: &str, message: impl Into<String>) -> Self {
        Self {
            variable: variable.to_string(),
            message: message.into(),
        }
    }
}

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
            Err(_) => Self::DEFAULT.ok_or_else(|| {
                EnvError::new(Self::NAME, "Required environment variable not set")
            }),
        }
    }
}

/// 核心环境变量
pub mod core {
    use super::*;

    /// 日志级别，`RUST_LOG` 存在时以它为准
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "WORDSWAP_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError::new(
                    Self::NAME,
                    format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                )),
            }
        }
    }
}

/// Web 服务器
pub mod web {
    use super::*;

    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "WORDSWAP_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "WORDSWAP_PORT";
        const DEFAULT: Option<u16> = Some(7080);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            match value.trim().parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(EnvError::new(
                    Self::NAME,
                    "Must be a valid port number (1-65535)",
                )),
            }
        }
    }

    /// 代理入口路径
    pub struct ProxyPath;
    impl EnvVar<String> for ProxyPath {
        const NAME: &'static str = "WORDSWAP_PROXY_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the proxy entry point";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("/proxy".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim().trim_end_matches('/');
            if !path.starts_with('/') || path.len() < 2 || path.contains(['?', '#']) {
                return Err(EnvError::new(
                    Self::NAME,
                    format!("Invalid path '{}'. Use an absolute path such as /proxy", value),
                ));
            }
            Ok(path.to_string())
        }
    }

    /// 静态文件目录（占位图片等）
    pub struct StaticDir;
    impl EnvVar<String> for StaticDir {
        const NAME: &'static str = "WORDSWAP_STATIC_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Static files directory served under /static";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("static".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }
}

/// 持久化
pub mod storage {
    use super::*;

    /// 数据目录：缓存在 `<dir>/cache`，词典文件直接放在 `<dir>` 下
    pub struct DataDir;
    impl EnvVar<String> for DataDir {
        const NAME: &'static str = "WORDSWAP_DATA_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory for the page cache and dictionary files";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("data".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

/// 抓取与缓存
pub mod network {
    use super::*;

    pub struct CacheTtl;
    impl EnvVar<Duration> for CacheTtl {
        const NAME: &'static str = "WORDSWAP_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(86_400));
        const DESCRIPTION: &'static str = "Cache freshness window in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1)
        }
    }

    pub struct FetchTimeout;
    impl EnvVar<Duration> for FetchTimeout {
        const NAME: &'static str = "WORDSWAP_FETCH_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Upstream request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1)
        }
    }

    pub struct UserAgent;
    impl EnvVar<String> for UserAgent {
        const NAME: &'static str = "WORDSWAP_USER_AGENT";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "User-Agent header sent upstream";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(default_user_agent()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub fn default_user_agent() -> String {
        format!("wordswap/{}", env!("CARGO_PKG_VERSION"))
    }
}

/// 页面改写
pub mod rewrite {
    use super::*;

    pub struct PlaceholderImage;
    impl EnvVar<String> for PlaceholderImage {
        const NAME: &'static str = "WORDSWAP_PLACEHOLDER_IMAGE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Image path substituted for matching images";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("/static/placeholder.jpg".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 需要替换的图片必须同时带有的类名，空格分隔
    pub struct ImageClasses;
    impl EnvVar<Vec<String>> for ImageClasses {
        const NAME: &'static str = "WORDSWAP_IMAGE_CLASSES";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Space separated class signature of replaced images";

        fn get() -> EnvResult<Vec<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Self::parse("w-100 h-auto"),
            }
        }

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let classes: Vec<String> = value.split_whitespace().map(str::to_string).collect();
            if classes.is_empty() {
                return Err(EnvError::new(Self::NAME, "At least one class is required"));
            }
            Ok(classes)
        }
    }

    /// 被移除元素引用的广告域名；空值表示不移除
    pub struct BlockedDomain;
    impl EnvVar<Option<String>> for BlockedDomain {
        const NAME: &'static str = "WORDSWAP_BLOCKED_DOMAIN";
        const DEFAULT: Option<Option<String>> = None;
        const DESCRIPTION: &'static str = "Elements referencing this domain are removed";

        fn get() -> EnvResult<Option<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(Some("adnxs.com".to_string())),
            }
        }

        fn parse(value: &str) -> EnvResult<Option<String>> {
            Ok(parse_optional(value))
        }
    }

    /// 插入到 `<body>` 开头的提示横幅；空值表示不插入
    pub struct Banner;
    impl EnvVar<Option<String>> for Banner {
        const NAME: &'static str = "WORDSWAP_BANNER";
        const DEFAULT: Option<Option<String>> = Some(None);
        const DESCRIPTION: &'static str = "Banner text shown at the top of proxied pages";

        fn parse(value: &str) -> EnvResult<Option<String>> {
            Ok(parse_optional(value))
        }
    }
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError::new(var_name, "Value cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_seconds(value: &str, var_name: &str, min: u64) -> EnvResult<Duration> {
    let seconds: u64 = value
        .trim()
        .parse()
        .map_err(|_| EnvError::new(var_name, "Must be a valid number of seconds"))?;

    if seconds < min {
        return Err(EnvError::new(
            var_name,
            format!("Value {} is below minimum {}", seconds, min),
        ));
    }

    Ok(Duration::from_secs(seconds))
}

/// 安装全局日志订阅器，输出到 stderr
///
/// `RUST_LOG` 优先；否则使用 `WORDSWAP_LOG_LEVEL`（默认 `info`）。重复调用无副作用。
pub fn init_tracing() {
    let level = core::LogLevel::get().unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("wordswap={},warn", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 环境变量文档
pub fn generate_env_docs() -> String {
    let entries: [(&str, &str); 14] = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (web::BindAddress::NAME, web::BindAddress::DESCRIPTION),
        (web::Port::NAME, web::Port::DESCRIPTION),
        (web::ProxyPath::NAME, web::ProxyPath::DESCRIPTION),
        (web::StaticDir::NAME, web::StaticDir::DESCRIPTION),
        (storage::DataDir::NAME, storage::DataDir::DESCRIPTION),
        (network::CacheTtl::NAME, network::CacheTtl::DESCRIPTION),
        (network::FetchTimeout::NAME, network::FetchTimeout::DESCRIPTION),
        (network::UserAgent::NAME, network::UserAgent::DESCRIPTION),
        (rewrite::PlaceholderImage::NAME, rewrite::PlaceholderImage::DESCRIPTION),
        (rewrite::ImageClasses::NAME, rewrite::ImageClasses::DESCRIPTION),
        (rewrite::BlockedDomain::NAME, rewrite::BlockedDomain::DESCRIPTION),
        (rewrite::Banner::NAME, rewrite::Banner::DESCRIPTION),
        ("RUST_LOG", "Overrides WORDSWAP_LOG_LEVEL with a full tracing filter"),
    ];

    let mut docs = String::from("# Environment Variables\n\n");
    for (name, description) in entries {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_port_parsing() {
        assert_eq!(web::Port::parse("8080").unwrap(), 8080);
        assert!(web::Port::parse("0").is_err());
        assert!(web::Port::parse("70000").is_err());
    }

    #[test]
    fn test_proxy_path_parsing() {
        assert_eq!(web::ProxyPath::parse("/proxy/").unwrap(), "/proxy");
        assert_eq!(web::ProxyPath::parse(" /p ").unwrap(), "/p");
        assert!(web::ProxyPath::parse("proxy").is_err());
        assert!(web::ProxyPath::parse("/").is_err());
        assert!(web::ProxyPath::parse("/p?x").is_err());
    }

    #[test]
    fn test_seconds_parsing() {
        assert_eq!(
            network::CacheTtl::parse("3600").unwrap(),
            Duration::from_secs(3600)
        );
        assert!(network::CacheTtl::parse("0").is_err());
        assert!(network::FetchTimeout::parse("soon").is_err());
    }

    #[test]
    fn test_rewrite_values() {
        assert_eq!(
            rewrite::ImageClasses::parse(" w-100  h-auto ").unwrap(),
            vec!["w-100", "h-auto"]
        );
        assert!(rewrite::ImageClasses::parse("   ").is_err());
        assert_eq!(rewrite::Banner::parse("  ").unwrap(), None);
        assert_eq!(
            rewrite::BlockedDomain::parse("ads.example").unwrap().as_deref(),
            Some("ads.example")
        );
    }

    #[test]
    fn test_env_docs_list_every_variable() {
        let docs = generate_env_docs();
        assert!(docs.contains("WORDSWAP_CACHE_TTL"));
        assert!(docs.contains("WORDSWAP_BLOCKED_DOMAIN"));
    }
}
