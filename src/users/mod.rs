//! # 用户与身份存储模块
//!
//! 本地用户、外部身份绑定的持久化与身份解析

pub mod resolver;
pub mod store;

pub use resolver::{IdentityResolver, ResolveBindError};
pub use store::{DbUserStore, NewOAuthUser, UserStore};
