//! # OAuth state 编解码
//!
//! state 是携带流程意图的自描述签名令牌：跨越不可信的浏览器重定向
//! 传递 action、目标用户、回跳地址与提供商绑定，服务端不保存会话。
//! 签名与过期时间是仅有的防重放手段。

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::oauth::Provider;

/// 未登录用户的占位 ID
pub const NO_USER: i32 = 0;

/// OAuth 流程意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthAction {
    Login,
    Register,
    Bind,
}

/// state 令牌载荷
///
/// 一次性消费但服务端不跟踪消费状态，`exp` 之前可重复解码。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub action: OAuthAction,
    #[serde(default)]
    pub user_id: i32,
    pub nonce: String,
    #[serde(default)]
    pub redirect: String,
    pub exp: i64,
    pub provider: String,
}

/// state 编解码器
pub struct StateCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl StateCodec {
    /// 创建编解码器，`ttl_secs` 为 state 的有效期
    #[must_use]
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// 生成签名 state
    ///
    /// 登录流程 `user_id` 传 [`NO_USER`]，绑定流程传已登录用户 ID。
    pub fn encode(
        &self,
        action: OAuthAction,
        user_id: i32,
        redirect: &str,
        provider: Provider,
    ) -> Result<String> {
        let state = OAuthState {
            action,
            user_id,
            nonce: random_string(16),
            redirect: redirect.to_string(),
            exp: Utc::now().timestamp() + self.ttl_secs,
            provider: provider.as_str().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &state, &self.encoding_key)
            .map_err(|e| crate::auth_error!("state 生成失败: {}", e))
    }

    /// 校验并解析 state
    ///
    /// 依次校验签名、过期时间与提供商绑定；跨提供商复用的 state 被拒绝。
    pub fn decode(
        &self,
        token: &str,
        expected_provider: Provider,
    ) -> std::result::Result<OAuthState, StateError> {
        let data = decode::<OAuthState>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => StateError::Expired,
                _ => StateError::InvalidSignature(e),
            },
        )?;

        let state = data.claims;
        if state.exp < Utc::now().timestamp() {
            return Err(StateError::Expired);
        }
        if state.provider != expected_provider.as_str() {
            return Err(StateError::ProviderMismatch {
                embedded: state.provider,
                requested: expected_provider,
            });
        }

        Ok(state)
    }
}

/// 生成指定长度的随机字母数字串
#[must_use]
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
