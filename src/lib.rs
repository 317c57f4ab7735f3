//! # Identity Hub
//!
//! 联合 OAuth2 身份解析服务：把外部提供商的身份映射到本地用户，
//! 支持登录自动注册与已登录用户的账号绑定。

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod users;
pub mod web;

pub use auth::{JwtManager, StateCodec};
pub use config::AppConfig;
pub use error::{IdentityError, Result};
pub use oauth::{
    AdapterRegistry, AuthorizeUrlBuilder, CallbackOrchestrator, Provider,
};
pub use users::{DbUserStore, IdentityResolver};
