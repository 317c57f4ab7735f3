//! # 认证模块
//!
//! 会话令牌签发与 OAuth state（意图令牌）的编解码

pub mod jwt;
pub mod state;

pub use jwt::{JwtManager, SessionClaims, TokenIssuer};
pub use state::{NO_USER, OAuthAction, OAuthState, StateCodec};
