//! # OAuth 流程错误分类
//!
//! 回调流程中每一类可预期失败的独立错误类型。
//! 编排器据此决定最终重定向：`StateError` 没有可信的重定向目标，
//! 其余错误携带 state 中的目标地址返回给前端。

use thiserror::Error;

use crate::oauth::Provider;

/// state（意图令牌）校验错误
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state 签名无效")]
    InvalidSignature(#[source] jsonwebtoken::errors::Error),

    #[error("state 已过期")]
    Expired,

    #[error("provider 不匹配: state 中为 {embedded}, 回调来自 {requested}")]
    ProviderMismatch {
        embedded: String,
        requested: Provider,
    },
}

/// OAuth2 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OAuth2 未配置: {0}")]
    NotConfigured(Provider),

    #[error("OAuth2 未启用: {0}")]
    NotEnabled(Provider),

    #[error("OAuth2 配置不完整: {provider} 缺少 {field}")]
    Incomplete {
        provider: Provider,
        field: &'static str,
    },
}

/// 授权码换取访问令牌失败
#[derive(Debug, Error)]
#[error("{provider} token 交换失败: {message}")]
pub struct ExchangeError {
    pub provider: Provider,
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl ExchangeError {
    pub fn new<T: Into<String>>(provider: Provider, message: T) -> Self {
        Self {
            provider,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>, E: Into<anyhow::Error>>(
        provider: Provider,
        message: T,
        source: E,
    ) -> Self {
        Self {
            provider,
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// 用户信息获取失败
///
/// 对 QQ 型提供商的昵称/头像接口为非致命错误，适配器内部降级处理；
/// 能传播到编排器的 `ProfileError` 一律终止流程。
#[derive(Debug, Error)]
#[error("{provider} 用户信息获取失败: {message}")]
pub struct ProfileError {
    pub provider: Provider,
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl ProfileError {
    pub fn new<T: Into<String>>(provider: Provider, message: T) -> Self {
        Self {
            provider,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>, E: Into<anyhow::Error>>(
        provider: Provider,
        message: T,
        source: E,
    ) -> Self {
        Self {
            provider,
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// 绑定冲突：外部身份已绑定到其他本地用户
#[derive(Debug, Error)]
#[error("该账号已被其他用户绑定 (provider={provider}, external_id={external_id})")]
pub struct ConflictError {
    pub provider: Provider,
    pub external_id: String,
    pub bound_user_id: i32,
}

/// 非管理员尝试绑定外部账号
#[derive(Debug, Error)]
#[error("没有绑定 {provider} 账号的权限")]
pub struct PermissionError {
    pub provider: Provider,
}

/// OAuth 流程错误聚合，便于统一传播
#[derive(Debug, Error)]
pub enum OAuthFlowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}
