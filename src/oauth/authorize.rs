//! # 授权 URL 构建
//!
//! 生成带签名 state 的提供商授权地址，登录与绑定共用一套构建逻辑

use std::sync::Arc;

use url::Url;

use crate::auth::{NO_USER, OAuthAction, StateCodec};
use crate::error::{PermissionError, Result};
use crate::oauth::settings::{OAuth2Settings, SettingsStore};
use crate::oauth::Provider;

/// 授权 URL 构建器
pub struct AuthorizeUrlBuilder {
    codec: Arc<StateCodec>,
    settings: Arc<dyn SettingsStore>,
}

impl AuthorizeUrlBuilder {
    #[must_use]
    pub fn new(codec: Arc<StateCodec>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { codec, settings }
    }

    /// 构建登录授权 URL
    pub async fn login_url(&self, provider: Provider, redirect: &str) -> Result<String> {
        let settings = OAuth2Settings::load_usable(self.settings.as_ref(), provider).await?;
        let state = self
            .codec
            .encode(OAuthAction::Login, NO_USER, redirect, provider)?;
        build_authorize_url(&settings, &state)
    }

    /// 构建绑定授权 URL，仅管理员可用
    pub async fn bind_url(
        &self,
        provider: Provider,
        user: &entity::users::Model,
        redirect: &str,
    ) -> Result<String> {
        if !user.is_admin {
            return Err(PermissionError { provider }.into());
        }
        let settings = OAuth2Settings::load_usable(self.settings.as_ref(), provider).await?;
        let state = self
            .codec
            .encode(OAuthAction::Bind, user.id, redirect, provider)?;
        build_authorize_url(&settings, &state)
    }
}

fn build_authorize_url(settings: &OAuth2Settings, state: &str) -> Result<String> {
    let mut url = Url::parse(&settings.auth_url)
        .map_err(|e| crate::config_error!("auth_url 不合法: {}", e))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &settings.client_id)
            .append_pair("redirect_uri", &settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);

        let scope = scope_for(settings);
        if !scope.is_empty() {
            query.append_pair("scope", &scope);
        }

        match settings.provider {
            // 要求返回 refresh_token 并强制出授权页
            Provider::Google => {
                query
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
            Provider::Github | Provider::Qq | Provider::Custom => {}
        }
    }

    Ok(url.to_string())
}

/// 计算 scope 参数：配置优先，QQ 缺省补 get_user_info
fn scope_for(settings: &OAuth2Settings) -> String {
    if settings.scopes.is_empty() {
        match settings.provider {
            Provider::Qq => "get_user_info".to_string(),
            _ => String::new(),
        }
    } else {
        settings.scopes.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: Provider, scopes: Vec<&str>) -> OAuth2Settings {
        OAuth2Settings {
            provider,
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            auth_url: "https://idp.test/authorize".to_string(),
            token_url: "https://idp.test/token".to_string(),
            user_info_url: "https://idp.test/user".to_string(),
            redirect_uri: "https://app.test/callback".to_string(),
            scopes: scopes.into_iter().map(String::from).collect(),
            enable: true,
        }
    }

    #[test]
    fn test_build_url_carries_standard_params() {
        let url =
            build_authorize_url(&settings(Provider::Github, vec!["read:user", "user:email"]), "ST")
                .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("client_id".to_string(), "cid".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("state".to_string(), "ST".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "read:user user:email".to_string())));
    }

    #[test]
    fn test_build_url_google_offline_access() {
        let url = build_authorize_url(&settings(Provider::Google, vec!["openid"]), "ST").unwrap();
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_build_url_qq_default_scope() {
        let url = build_authorize_url(&settings(Provider::Qq, vec![]), "ST").unwrap();
        assert!(url.contains("scope=get_user_info"));
    }

    #[test]
    fn test_build_url_rejects_bad_auth_url() {
        let mut s = settings(Provider::Custom, vec![]);
        s.auth_url = "not a url".to_string();
        assert!(build_authorize_url(&s, "ST").is_err());
    }
}
