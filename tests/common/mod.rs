//! 集成测试共享夹具：内存存储与各类桩实现

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use identity_hub::auth::TokenIssuer;
use identity_hub::error::{ExchangeError, IdentityError, ProfileError, Result};
use identity_hub::oauth::adapter::{ProviderAdapter, RawProfile};
use identity_hub::oauth::settings::{OAuth2Settings, SettingsStore};
use identity_hub::oauth::Provider;
use identity_hub::users::{NewOAuthUser, UserStore};

/// 内存用户存储，按数据库的唯一约束语义裁决冲突
#[derive(Default)]
pub struct InMemoryUserStore {
    pub users: Mutex<Vec<entity::users::Model>>,
    pub identities: Mutex<Vec<entity::oauth_identities::Model>>,
    next_user_id: AtomicI32,
    next_identity_id: AtomicI32,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            identities: Mutex::new(Vec::new()),
            next_user_id: AtomicI32::new(1),
            next_identity_id: AtomicI32::new(1),
        }
    }

    /// 预置一个用户
    pub fn seed_user(&self, username: &str, is_admin: bool) -> entity::users::Model {
        let user = entity::users::Model {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            username: username.to_string(),
            password_hash: "x".to_string(),
            is_admin,
            avatar_url: String::new(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    /// 预置一条绑定
    pub fn seed_identity(&self, user_id: i32, provider: Provider, external_id: &str) {
        self.identities
            .lock()
            .unwrap()
            .push(entity::oauth_identities::Model {
                id: self.next_identity_id.fetch_add(1, Ordering::SeqCst),
                user_id,
                provider: provider.as_str().to_string(),
                external_id: external_id.to_string(),
                created_at: Utc::now().naive_utc(),
            });
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<entity::users::Model>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<entity::users::Model>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_identity(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<entity::oauth_identities::Model>> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.provider == provider.as_str() && i.external_id == external_id)
            .cloned())
    }

    async fn find_identity_for_user(
        &self,
        user_id: i32,
        provider: Provider,
    ) -> Result<Option<entity::oauth_identities::Model>> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id && i.provider == provider.as_str())
            .cloned())
    }

    async fn find_by_external_identity(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<entity::users::Model>> {
        let Some(identity) = self.find_identity(provider, external_id).await? else {
            return Ok(None);
        };
        self.find_by_id(identity.user_id).await
    }

    async fn create_user_with_identity(
        &self,
        new_user: NewOAuthUser,
    ) -> Result<entity::users::Model> {
        {
            let users = self.users.lock().unwrap();
            if users.iter().any(|u| u.username == new_user.username) {
                return Err(IdentityError::conflict("唯一约束", "users.username"));
            }
        }
        {
            let identities = self.identities.lock().unwrap();
            if identities.iter().any(|i| {
                i.provider == new_user.provider.as_str() && i.external_id == new_user.external_id
            }) {
                return Err(IdentityError::conflict(
                    "唯一约束",
                    "oauth_identities.provider_external_id",
                ));
            }
        }

        let user = entity::users::Model {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            username: new_user.username,
            password_hash: new_user.password_hash,
            is_admin: false,
            avatar_url: new_user.avatar_url,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };
        self.users.lock().unwrap().push(user.clone());
        self.seed_identity(user.id, new_user.provider, &new_user.external_id);
        Ok(user)
    }

    async fn bind_identity(
        &self,
        user_id: i32,
        provider: Provider,
        external_id: &str,
    ) -> Result<()> {
        {
            let identities = self.identities.lock().unwrap();
            if identities
                .iter()
                .any(|i| i.provider == provider.as_str() && i.external_id == external_id)
            {
                return Err(IdentityError::conflict(
                    "唯一约束",
                    "oauth_identities.provider_external_id",
                ));
            }
        }
        self.seed_identity(user_id, provider, external_id);
        Ok(())
    }
}

/// 固定返回一条配置的配置存储
pub struct StaticSettingsStore {
    pub settings: Option<OAuth2Settings>,
}

impl StaticSettingsStore {
    pub fn with(settings: OAuth2Settings) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    pub fn empty() -> Self {
        Self { settings: None }
    }
}

#[async_trait]
impl SettingsStore for StaticSettingsStore {
    async fn active_settings(&self) -> Result<Option<OAuth2Settings>> {
        Ok(self.settings.clone())
    }
}

/// 构造一条完整可用的测试配置
pub fn test_settings(provider: Provider) -> OAuth2Settings {
    OAuth2Settings {
        provider,
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        auth_url: "https://idp.test/authorize".to_string(),
        token_url: "https://idp.test/token".to_string(),
        user_info_url: "https://idp.test/user".to_string(),
        redirect_uri: "https://app.test/oauth/callback".to_string(),
        scopes: vec!["read".to_string()],
        enable: true,
    }
}

/// 固定结果的适配器桩
pub struct StubAdapter {
    pub provider: Provider,
    pub external_id: String,
    pub profile: RawProfile,
    pub fail_exchange: bool,
    pub fail_profile: bool,
}

impl StubAdapter {
    pub fn github(external_id: &str, login: &str) -> Self {
        Self {
            provider: Provider::Github,
            external_id: external_id.to_string(),
            profile: RawProfile::Custom(serde_json::json!({ "name": login })),
            fail_exchange: false,
            fail_profile: false,
        }
    }
}

#[async_trait]
impl ProviderAdapter for StubAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn exchange_code(
        &self,
        _settings: &OAuth2Settings,
        _code: &str,
    ) -> std::result::Result<String, ExchangeError> {
        if self.fail_exchange {
            return Err(ExchangeError::new(self.provider, "token 端点返回 400"));
        }
        Ok("stub-access-token".to_string())
    }

    async fn fetch_profile(
        &self,
        _settings: &OAuth2Settings,
        _access_token: &str,
    ) -> std::result::Result<(String, RawProfile), ProfileError> {
        if self.fail_profile {
            return Err(ProfileError::new(self.provider, "用户信息端点返回 500"));
        }
        Ok((self.external_id.clone(), self.profile.clone()))
    }
}

/// token 签发桩
pub struct StubTokenIssuer {
    pub fail: bool,
}

impl TokenIssuer for StubTokenIssuer {
    fn issue_token(&self, user_id: i32, username: &str, _is_admin: bool) -> Result<String> {
        if self.fail {
            return Err(identity_hub::auth_error!("签发失败"));
        }
        Ok(format!("token-{user_id}-{username}"))
    }
}
