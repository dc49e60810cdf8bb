//! 服务配置
//!
//! 配置从 TOML 文件加载，找不到文件时使用默认值，随后应用环境变量覆盖。
//! 配置作为普通值在启动时构造并传递，不保存在全局变量中。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 默认的配置文件搜索路径
const CONFIG_PATHS: [&str; 2] = ["config.toml", "./config/config.toml"];

/// 服务配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 存储配置
    pub database: DatabaseConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 分页配置
    pub pagination: PaginationConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口
    pub port: u16,
    /// 请求超时时间（秒）
    pub request_timeout_secs: u64,
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// 数据库连接串，仅 postgres 后端使用
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 获取连接超时（秒）
    pub acquire_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 日志文件目录，为空时不写文件
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
    /// 是否启用控制台输出
    pub console_output: bool,
}

/// 分页配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// 未指定 limit 时的每页数量
    pub default_limit: u64,
    /// 每页数量上限
    pub max_limit: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: String::new(),
            max_connections: 20,
            min_connections: 5,
            acquire_timeout_secs: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            file_prefix: "user-service".to_string(),
            console_output: true,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(e.to_string()))?;
        }

        fs::write(path.as_ref(), content).map_err(|e| ConfigError::FileWrite(e.to_string()))
    }

    /// 应用环境变量覆盖
    ///
    /// `lookup` 通常是 `|key| std::env::var(key).ok()`，测试中可以替换。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("无效的端口: {}", port)))?;
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
            self.database.backend = StoreBackend::Postgres;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }

        if self.database.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Validation(
                "postgres 后端需要配置 database.url".to_string(),
            ));
        }

        if self.pagination.default_limit == 0 || self.pagination.max_limit == 0 {
            return Err(ConfigError::Validation("分页大小必须大于0".to_string()));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(ConfigError::Validation(format!(
                "default_limit ({}) 不能大于 max_limit ({})",
                self.pagination.default_limit, self.pagination.max_limit
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("文件写入错误: {0}")]
    FileWrite(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置序列化错误: {0}")]
    Serialize(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 加载配置：`APP_CONFIG` 指定的文件优先，其次是默认搜索路径，最后是默认值。
/// 之后应用环境变量覆盖并验证。
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = match std::env::var("APP_CONFIG") {
        Ok(path) => {
            info!("Loading config from {}", path);
            Config::load_from_file(path)?
        }
        Err(_) => match CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(path) => {
                info!("Loading config from {}", path);
                Config::load_from_file(path)?
            }
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.pagination.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.backend = StoreBackend::Postgres;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.server.port = 4100;
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.server.port, 4100);
        assert_eq!(loaded.pagination.max_limit, config.pagination.max_limit);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8088\n").unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.pagination.default_limit, 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9001"),
            ("DATABASE_URL", "postgres://localhost/users"),
            ("LOG_LEVEL", "DEBUG"),
        ]);

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.url, "postgres://localhost/users");
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "abc".to_string()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
