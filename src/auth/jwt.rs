//! # JWT 会话令牌管理
//!
//! 身份解析完成后签发会话令牌，供上层 API 鉴权使用

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 会话令牌载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// 会话令牌签发接口
///
/// 回调编排只依赖签发能力，便于测试替换。
pub trait TokenIssuer: Send + Sync {
    fn issue_token(&self, user_id: i32, username: &str, is_admin: bool) -> Result<String>;
}

/// JWT 管理器
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: i64,
}

impl JwtManager {
    /// 创建 JWT 管理器，`expires_in` 为令牌有效期（秒）
    #[must_use]
    pub fn new(secret: &str, expires_in: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        }
    }

    /// 生成会话令牌
    pub fn generate_token(&self, user_id: i32, username: &str, is_admin: bool) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            user_id,
            username: username.to_string(),
            is_admin,
            iat: now,
            exp: now + self.expires_in,
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| crate::auth_error!("生成 token 失败: {}", e))
    }

    /// 校验并解析会话令牌
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| crate::auth_error!("token 无效: {}", e))?;
        Ok(data.claims)
    }
}

impl TokenIssuer for JwtManager {
    fn issue_token(&self, user_id: i32, username: &str, is_admin: bool) -> Result<String> {
        self.generate_token(user_id, username, is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let manager = JwtManager::new("test-secret-key-for-jwt-manager", 3600);
        let token = manager.generate_token(42, "alice", false).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let manager = JwtManager::new("test-secret-key-for-jwt-manager", 3600);
        let token = manager.generate_token(1, "bob", true).unwrap();

        let other = JwtManager::new("a-completely-different-secret", 3600);
        assert!(other.validate_token(&token).is_err());
    }
}
