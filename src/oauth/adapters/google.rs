//! Google 型适配器：标准 form POST 换 token，`sub` 作为外部身份 ID

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ExchangeError, ProfileError};
use crate::oauth::adapter::{ProviderAdapter, RawProfile, http_client};
use crate::oauth::{OAuth2Settings, Provider};

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    #[serde(default)]
    access_token: String,
}

/// userinfo 端点响应（OpenID Connect 风格）
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

pub struct GoogleAdapter {
    client: reqwest::Client,
}

impl GoogleAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for GoogleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn exchange_code(
        &self,
        settings: &OAuth2Settings,
        code: &str,
    ) -> std::result::Result<String, ExchangeError> {
        let provider = self.provider();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&settings.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "请求 token 端点失败", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::new(
                provider,
                format!("token 端点返回 {status}"),
            ));
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "token 响应解析失败", e))?;

        if token.access_token.is_empty() {
            return Err(ExchangeError::new(provider, "响应中缺少 access_token"));
        }

        Ok(token.access_token)
    }

    async fn fetch_profile(
        &self,
        settings: &OAuth2Settings,
        access_token: &str,
    ) -> std::result::Result<(String, RawProfile), ProfileError> {
        let provider = self.provider();
        let response = self
            .client
            .get(&settings.user_info_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProfileError::with_source(provider, "请求用户信息失败", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileError::new(
                provider,
                format!("用户信息端点返回 {status}"),
            ));
        }

        let user: GoogleUser = response
            .json()
            .await
            .map_err(|e| ProfileError::with_source(provider, "用户信息解析失败", e))?;

        if user.sub.is_empty() {
            return Err(ProfileError::new(provider, "响应中缺少 sub"));
        }

        Ok((user.sub.clone(), RawProfile::Google(user)))
    }
}
