//! QQ 型适配器：GET 换 token、二段式身份获取
//!
//! 历史遗留的 wire 格式：token 端点可能返回 JSON 或 URL 编码键值对，
//! openid 端点返回 JSONP 包裹的 JSON。昵称/头像接口失败不阻断流程。

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ExchangeError, ProfileError};
use crate::oauth::adapter::{ProviderAdapter, RawProfile, http_client};
use crate::oauth::{OAuth2Settings, Provider};

const DEFAULT_OPENID_URL: &str = "https://graph.qq.com/oauth2.0/me";

#[derive(Debug, Default, Deserialize)]
struct QqTokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct QqOpenIdResponse {
    #[serde(default)]
    #[allow(dead_code)]
    client_id: String,
    #[serde(default)]
    openid: String,
}

/// get_user_info 端点响应
///
/// 全部字段可缺省：接口失败时以 `Default` 降级，归一化阶段再兜底。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QqUser {
    #[serde(default)]
    pub ret: i32,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub figureurl_1: String,
    #[serde(default)]
    pub figureurl_2: String,
    #[serde(default)]
    pub figureurl_qq_1: String,
    #[serde(default)]
    pub figureurl_qq_2: String,
    #[serde(default)]
    pub gender: String,
}

pub struct QqAdapter {
    client: reqwest::Client,
    openid_url: String,
}

impl QqAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http_client(),
            openid_url: DEFAULT_OPENID_URL.to_string(),
        }
    }

    /// 覆盖 openid 端点地址（测试用）
    #[must_use]
    pub fn with_openid_url<T: Into<String>>(mut self, url: T) -> Self {
        self.openid_url = url.into();
        self
    }
}

impl Default for QqAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// 去掉 JSONP 包裹：`callback( {...} );` -> `{...}`
fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(open) = trimmed.find('(') else {
        return trimmed;
    };
    let Some(close) = trimmed.rfind(')') else {
        return trimmed;
    };
    if open < close {
        trimmed[open + 1..close].trim()
    } else {
        trimmed
    }
}

/// 从 URL 编码键值对中取 access_token
fn token_from_form(body: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == "access_token")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ProviderAdapter for QqAdapter {
    fn provider(&self) -> Provider {
        Provider::Qq
    }

    async fn exchange_code(
        &self,
        settings: &OAuth2Settings,
        code: &str,
    ) -> std::result::Result<String, ExchangeError> {
        let provider = self.provider();
        let response = self
            .client
            .get(&settings.token_url)
            .query(&[
                ("grant_type", "authorization_code"),
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", settings.redirect_uri.as_str()),
                ("fmt", "json"),
            ])
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

        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::with_source(provider, "读取 token 响应失败", e))?;

        // fmt=json 并非所有部署都遵守，JSON 解析失败时回退 URL 编码格式
        let token = match serde_json::from_str::<QqTokenResponse>(strip_jsonp(&body)) {
            Ok(parsed) if !parsed.access_token.is_empty() => parsed.access_token,
            _ => token_from_form(&body).ok_or_else(|| {
                ExchangeError::new(provider, "响应中缺少 access_token")
            })?,
        };

        Ok(token)
    }

    async fn fetch_profile(
        &self,
        settings: &OAuth2Settings,
        access_token: &str,
    ) -> std::result::Result<(String, RawProfile), ProfileError> {
        let provider = self.provider();

        // 第一步：openid 查询，失败即终止
        let response = self
            .client
            .get(&self.openid_url)
            .query(&[("access_token", access_token), ("fmt", "json")])
            .send()
            .await
            .map_err(|e| ProfileError::with_source(provider, "请求 openid 端点失败", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileError::new(
                provider,
                format!("openid 端点返回 {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProfileError::with_source(provider, "读取 openid 响应失败", e))?;

        let openid_response: QqOpenIdResponse = serde_json::from_str(strip_jsonp(&body))
            .map_err(|e| ProfileError::with_source(provider, "openid 响应解析失败", e))?;

        if openid_response.openid.is_empty() {
            return Err(ProfileError::new(provider, "响应中缺少 openid"));
        }
        let openid = openid_response.openid;

        // 第二步：昵称/头像属锦上添花，任何失败都降级为空资料
        let user = self
            .fetch_user_info(settings, access_token, &openid)
            .await
            .unwrap_or_else(|e| {
                warn!(provider = %provider, error = %e, "用户信息获取失败，降级为空资料");
                QqUser::default()
            });

        Ok((openid, RawProfile::Qq(user)))
    }
}

impl QqAdapter {
    async fn fetch_user_info(
        &self,
        settings: &OAuth2Settings,
        access_token: &str,
        openid: &str,
    ) -> std::result::Result<QqUser, ProfileError> {
        let provider = self.provider();
        let response = self
            .client
            .get(&settings.user_info_url)
            .query(&[
                ("access_token", access_token),
                ("oauth_consumer_key", settings.client_id.as_str()),
                ("openid", openid),
            ])
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

        let user: QqUser = response
            .json()
            .await
            .map_err(|e| ProfileError::with_source(provider, "用户信息解析失败", e))?;

        if user.ret != 0 {
            return Err(ProfileError::new(
                provider,
                format!("用户信息接口返回 ret={}: {}", user.ret, user.msg),
            ));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_jsonp_unwraps_callback() {
        let body = r#"callback( {"client_id":"cid","openid":"OID"} );"#;
        let inner = strip_jsonp(body);
        let parsed: QqOpenIdResponse = serde_json::from_str(inner).unwrap();
        assert_eq!(parsed.openid, "OID");
    }

    #[test]
    fn test_strip_jsonp_passes_plain_json() {
        let body = r#"{"openid":"OID"}"#;
        assert_eq!(strip_jsonp(body), body);
    }

    #[test]
    fn test_token_from_form_parses_urlencoded() {
        let body = "access_token=AT123&expires_in=7776000&refresh_token=RT";
        assert_eq!(token_from_form(body).as_deref(), Some("AT123"));
    }

    #[test]
    fn test_token_from_form_rejects_missing_token() {
        assert!(token_from_form("expires_in=7776000").is_none());
        assert!(token_from_form("access_token=").is_none());
    }
}
