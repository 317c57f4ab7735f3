//! # 回调编排
//!
//! OAuth 回调的统一入口：校验 state、换 token、取资料、解析身份，
//! 最终产出面向浏览器的重定向地址。
//!
//! 编排器不返回错误：所有失败都折叠进重定向的查询参数，
//! 只有 state 本身不可信时才返回空字符串（没有可信的跳转目标）。

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::auth::{NO_USER, OAuthAction, OAuthState, StateCodec, TokenIssuer};
use crate::oauth::adapter::{AdapterRegistry, RawProfile};
use crate::oauth::profile::normalize;
use crate::oauth::settings::{OAuth2Settings, SettingsStore};
use crate::oauth::Provider;
use crate::users::{IdentityResolver, ResolveBindError};

/// 回调编排器
pub struct CallbackOrchestrator {
    codec: Arc<StateCodec>,
    settings: Arc<dyn SettingsStore>,
    adapters: Arc<AdapterRegistry>,
    resolver: Arc<IdentityResolver>,
    tokens: Arc<dyn TokenIssuer>,
}

impl CallbackOrchestrator {
    #[must_use]
    pub fn new(
        codec: Arc<StateCodec>,
        settings: Arc<dyn SettingsStore>,
        adapters: Arc<AdapterRegistry>,
        resolver: Arc<IdentityResolver>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            codec,
            settings,
            adapters,
            resolver,
            tokens,
        }
    }

    /// 处理 OAuth 回调，返回最终重定向地址
    ///
    /// state 校验失败时返回空字符串：伪造的 state 里没有可信的跳转目标。
    pub async fn handle_callback(&self, provider: Provider, code: &str, state: &str) -> String {
        let oauth_state = match self.codec.decode(state, provider) {
            Ok(s) => s,
            Err(e) => {
                warn!(provider = %provider, error = %e, "state 校验失败");
                return String::new();
            }
        };

        let settings = match OAuth2Settings::load_usable(self.settings.as_ref(), provider).await {
            Ok(s) => s,
            Err(e) => {
                warn!(provider = %provider, error = %e, "OAuth 配置不可用");
                return error_redirect(&oauth_state.redirect, "OAuth配置错误");
            }
        };

        let Some(adapter) = self.adapters.get(provider) else {
            return error_redirect(&oauth_state.redirect, "OAuth配置错误");
        };

        // 部分提供商会在授权码后拼接 fragment，交换前剥掉
        let code = code.split('#').next().unwrap_or_default();

        let access_token = match adapter.exchange_code(&settings, code).await {
            Ok(t) => t,
            Err(e) => {
                warn!(provider = %provider, error = %e, "token 交换失败");
                return error_redirect(&oauth_state.redirect, &e.to_string());
            }
        };

        let (external_id, raw_profile) = match adapter.fetch_profile(&settings, &access_token).await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = %provider, error = %e, "用户信息获取失败");
                return error_redirect(&oauth_state.redirect, &e.to_string());
            }
        };

        match oauth_state.action {
            OAuthAction::Login if oauth_state.user_id == NO_USER => {
                self.handle_login(provider, &oauth_state, &external_id, &raw_profile)
                    .await
            }
            OAuthAction::Bind if oauth_state.user_id != NO_USER => {
                self.handle_bind(provider, &oauth_state, &external_id).await
            }
            // action 与 user_id 不自洽的 state 一律视为非法
            _ => {
                warn!(
                    provider = %provider,
                    action = ?oauth_state.action,
                    user_id = oauth_state.user_id,
                    "state 的 action 与 user_id 不自洽"
                );
                String::new()
            }
        }
    }

    async fn handle_login(
        &self,
        provider: Provider,
        oauth_state: &OAuthState,
        external_id: &str,
        raw_profile: &RawProfile,
    ) -> String {
        let profile = normalize(provider, raw_profile);

        let user = match self
            .resolver
            .resolve_login(provider, external_id, &profile)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                warn!(provider = %provider, error = %e, "登录解析失败");
                return error_redirect(&oauth_state.redirect, "创建用户失败");
            }
        };

        let token = match self
            .tokens
            .issue_token(user.id, &user.username, user.is_admin)
        {
            Ok(t) => t,
            Err(e) => {
                warn!(provider = %provider, user_id = user.id, error = %e, "token 签发失败");
                return error_redirect(&oauth_state.redirect, "生成token失败");
            }
        };

        info!(provider = %provider, user_id = user.id, "OAuth 登录成功");
        success_redirect(&oauth_state.redirect, &token)
    }

    async fn handle_bind(
        &self,
        provider: Provider,
        oauth_state: &OAuthState,
        external_id: &str,
    ) -> String {
        match self
            .resolver
            .resolve_bind(provider, external_id, oauth_state.user_id)
            .await
        {
            Ok(()) => {
                info!(provider = %provider, user_id = oauth_state.user_id, "OAuth 绑定成功");
                bind_success_redirect(&oauth_state.redirect)
            }
            Err(ResolveBindError::Conflict(e)) => {
                warn!(provider = %provider, bound_user_id = e.bound_user_id, "绑定冲突");
                bind_error_redirect(&oauth_state.redirect, "该账号已被其他用户绑定")
            }
            Err(ResolveBindError::Store(e)) => {
                warn!(provider = %provider, error = %e, "绑定写入失败");
                bind_error_redirect(&oauth_state.redirect, "绑定失败")
            }
        }
    }
}

/// 给重定向地址追加查询参数，地址为空或不合法时返回空字符串
fn with_query(redirect: &str, pairs: &[(&str, &str)]) -> String {
    if redirect.is_empty() {
        return String::new();
    }
    let Ok(mut url) = Url::parse(redirect) else {
        return String::new();
    };
    url.query_pairs_mut().extend_pairs(pairs);
    url.to_string()
}

fn success_redirect(redirect: &str, token: &str) -> String {
    with_query(redirect, &[("token", token)])
}

fn error_redirect(redirect: &str, message: &str) -> String {
    with_query(redirect, &[("error", message)])
}

fn bind_success_redirect(redirect: &str) -> String {
    with_query(redirect, &[("bind", "success")])
}

fn bind_error_redirect(redirect: &str, message: &str) -> String {
    with_query(redirect, &[("bind", "error"), ("error", message)])
}
