//! GitHub 型适配器：JSON POST 换 token，数值型用户 ID

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ExchangeError, ProfileError};
use crate::oauth::adapter::{ProviderAdapter, RawProfile, http_client};
use crate::oauth::{OAuth2Settings, Provider};

/// token 端点响应
#[derive(Debug, Deserialize)]
struct GithubTokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// 用户信息端点响应
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub struct GithubAdapter {
    client: reqwest::Client,
}

impl GithubAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for GithubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GithubAdapter {
    fn provider(&self) -> Provider {
        Provider::Github
    }

    async fn exchange_code(
        &self,
        settings: &OAuth2Settings,
        code: &str,
    ) -> std::result::Result<String, ExchangeError> {
        let provider = self.provider();
        let body = serde_json::json!({
            "client_id": settings.client_id,
            "client_secret": settings.client_secret,
            "code": code,
            "redirect_uri": settings.redirect_uri,
        });

        let response = self
            .client
            .post(&settings.token_url)
            .header("Accept", "application/json")
            .json(&body)
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

        let token: GithubTokenResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "token 响应解析失败", e))?;

        if let Some(error) = token.error {
            let detail = token.error_description.unwrap_or_default();
            return Err(ExchangeError::new(
                provider,
                format!("{error}: {detail}"),
            ));
        }
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
            .header("Accept", "application/json")
            .header("User-Agent", "identity-hub")
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

        let user: GithubUser = response
            .json()
            .await
            .map_err(|e| ProfileError::with_source(provider, "用户信息解析失败", e))?;

        Ok((user.id.to_string(), RawProfile::Github(user)))
    }
}
