//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::oauth::OAuthFlowError;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum IdentityError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 唯一约束冲突（并发注册/绑定时的可恢复冲突）
    #[error("资源冲突: {resource} {identifier}")]
    Conflict {
        resource: String,
        identifier: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 网络通信错误
    #[error("网络错误: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证和授权错误
    #[error("认证错误: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// OAuth 流程错误
    #[error(transparent)]
    OAuth(#[from] OAuthFlowError),

    /// 业务逻辑错误
    #[error("业务错误: {message}")]
    Business { message: String },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带上下文信息的错误包装
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<IdentityError>,
    },
}

impl IdentityError {
    /// 将错误转换为HTTP状态码和错误代码
    pub fn to_http_response_parts(&self) -> (StatusCode, &str) {
        match self {
            Self::Config { .. } => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "RESOURCE_CONFLICT"),
            Self::Network { .. } => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
            Self::Auth { .. } => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            Self::OAuth(flow) => match flow {
                OAuthFlowError::Permission(_) => (StatusCode::FORBIDDEN, "PERMISSION_ERROR"),
                OAuthFlowError::Conflict(_) => (StatusCode::CONFLICT, "RESOURCE_CONFLICT"),
                OAuthFlowError::Config(_) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
                OAuthFlowError::State(_) => (StatusCode::BAD_REQUEST, "STATE_INVALID"),
                _ => (StatusCode::BAD_GATEWAY, "OAUTH_ERROR"),
            },
            Self::Business { .. } => (StatusCode::BAD_REQUEST, "BUSINESS_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建唯一约束冲突错误
    pub fn conflict<T: Into<String>, I: Into<String>>(resource: T, identifier: I) -> Self {
        Self::Conflict {
            resource: resource.into(),
            identifier: identifier.into(),
            source: None,
        }
    }

    /// 创建带来源的唯一约束冲突错误
    pub fn conflict_with_source<T: Into<String>, I: Into<String>, E: Into<anyhow::Error>>(
        resource: T,
        identifier: I,
        source: E,
    ) -> Self {
        Self::Conflict {
            resource: resource.into(),
            identifier: identifier.into(),
            source: Some(source.into()),
        }
    }

    /// 创建网络错误
    pub fn network<T: Into<String>>(message: T) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的网络错误
    pub fn network_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建认证错误
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的认证错误
    pub fn auth_with_source<T: Into<String>, E: Into<anyhow::Error>>(message: T, source: E) -> Self {
        Self::Auth {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建业务错误
    pub fn business<T: Into<String>>(message: T) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 是否为唯一约束冲突（解析到底层的 `Context` 包装）
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Context { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for IdentityError {
    fn from(err: std::io::Error) -> Self {
        Self::internal_with_source("文件操作失败", err)
    }
}

impl From<toml::de::Error> for IdentityError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for IdentityError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return Self::conflict_with_source("唯一约束", detail, err);
        }
        Self::database_with_source("数据库操作失败", err)
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_with_source("HTTP请求失败", err)
    }
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::auth_with_source("JWT处理失败", err)
    }
}

impl From<bcrypt::BcryptError> for IdentityError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::auth_with_source("密码处理失败", err)
    }
}

impl From<super::oauth::ConfigError> for IdentityError {
    fn from(err: super::oauth::ConfigError) -> Self {
        Self::OAuth(OAuthFlowError::Config(err))
    }
}

impl From<super::oauth::StateError> for IdentityError {
    fn from(err: super::oauth::StateError) -> Self {
        Self::OAuth(OAuthFlowError::State(err))
    }
}

impl From<super::oauth::PermissionError> for IdentityError {
    fn from(err: super::oauth::PermissionError) -> Self {
        Self::OAuth(OAuthFlowError::Permission(err))
    }
}
