//! # 应用配置模块
//!
//! TOML 配置加载与校验，支持环境变量覆盖关键字段

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Context, Result};

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 认证与令牌配置
    pub auth: AuthConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接串，如 `sqlite://data/identity.db`
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// 认证与令牌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT 签名密钥，同时用于会话令牌与 OAuth state
    pub jwt_secret: String,
    /// 会话令牌有效期（秒）
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: i64,
    /// OAuth state（意图令牌）有效期（秒）
    #[serde(default = "default_state_ttl")]
    pub state_ttl_secs: i64,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_jwt_expires_in() -> i64 {
    86_400
}

const fn default_state_ttl() -> i64 {
    600
}

impl AppConfig {
    /// 从 TOML 文件加载配置并应用环境变量覆盖
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("读取配置文件失败: {}", path.as_ref().display()))?;
        let mut config: Self = toml::from_str(&raw)?;

        // 环境变量覆盖敏感字段
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }

        config.validate()?;
        Ok(config)
    }

    /// 校验配置合法性
    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(crate::config_error!("database.url 不能为空"));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(crate::config_error!("auth.jwt_secret 长度至少 16 字符"));
        }
        if self.auth.state_ttl_secs <= 0 {
            return Err(crate::config_error!("auth.state_ttl_secs 必须为正数"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let raw = r#"
            [database]
            url = "sqlite://data/identity.db"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_expires_in, 86_400);
        assert_eq!(config.auth.state_ttl_secs, 600);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "sqlite://x.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "short".to_string(),
                jwt_expires_in: 3600,
                state_ttl_secs: 600,
            },
        };
        assert!(config.validate().is_err());
    }
}
