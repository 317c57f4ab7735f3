//! 自定义型适配器：对接非标准 OAuth2 服务，靠字段探测容忍响应差异

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ExchangeError, ProfileError};
use crate::oauth::adapter::{ProviderAdapter, RawProfile, http_client};
use crate::oauth::{OAuth2Settings, Provider};

/// 外部身份 ID 的候选字段，按顺序探测
const ID_FIELDS: [&str; 5] = ["id", "sub", "user_id", "uid", "openid"];

pub struct CustomAdapter {
    client: reqwest::Client,
}

impl CustomAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for CustomAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// 取出非空字符串表示：字符串直接用，数值转十进制文本
pub(crate) fn value_to_nonempty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn probe_field(object: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| object.get(key).and_then(value_to_nonempty_string))
}

#[async_trait]
impl ProviderAdapter for CustomAdapter {
    fn provider(&self) -> Provider {
        Provider::Custom
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
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "请求 token 端点失败", e))?;

        let status = response.status();
        // 部分实现对成功创建返回 201
        if !status.is_success() {
            return Err(ExchangeError::new(
                provider,
                format!("token 端点返回 {status}"),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "token 响应解析失败", e))?;

        probe_field(&body, &["access_token"])
            .ok_or_else(|| ExchangeError::new(provider, "响应中缺少 access_token"))
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

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProfileError::with_source(provider, "用户信息解析失败", e))?;

        let external_id = probe_field(&body, &ID_FIELDS)
            .ok_or_else(|| ProfileError::new(provider, "响应中没有可用的用户 ID 字段"))?;

        Ok((external_id, RawProfile::Custom(body)))
    }
}
