//! # OAuth2 配置加载
//!
//! 从数据库读取提供商配置并做可用性校验。
//! 系统同一时间只有一条活动配置，provider 字段决定回调走哪个适配器。

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::error::{ConfigError, Result};
use crate::oauth::Provider;

/// 校验后的 OAuth2 提供商配置
#[derive(Debug, Clone)]
pub struct OAuth2Settings {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub enable: bool,
}

impl OAuth2Settings {
    /// 从数据库实体构建配置
    ///
    /// `scopes` 字段是 JSON 数组文本，解析失败按空列表处理。
    #[must_use]
    pub fn from_model(model: &entity::oauth_settings::Model) -> Option<Self> {
        let provider = Provider::parse(&model.provider)?;
        let scopes: Vec<String> = serde_json::from_str(&model.scopes).unwrap_or_default();

        Some(Self {
            provider,
            client_id: model.client_id.clone(),
            client_secret: model.client_secret.clone(),
            auth_url: model.auth_url.clone(),
            token_url: model.token_url.clone(),
            user_info_url: model.user_info_url.clone(),
            redirect_uri: model.redirect_uri.clone(),
            scopes,
            enable: model.enable,
        })
    }

    /// 可用性校验：启用状态与必填字段
    pub fn ensure_usable(&self) -> std::result::Result<(), ConfigError> {
        if !self.enable {
            return Err(ConfigError::NotEnabled(self.provider));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "client_id",
            });
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "client_secret",
            });
        }
        if self.auth_url.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "auth_url",
            });
        }
        if self.token_url.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "token_url",
            });
        }
        if self.user_info_url.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "user_info_url",
            });
        }
        if self.redirect_uri.is_empty() {
            return Err(ConfigError::Incomplete {
                provider: self.provider,
                field: "redirect_uri",
            });
        }
        Ok(())
    }

    /// 加载指定提供商的可用配置，配置缺失或不可用时返回 [`ConfigError`]
    pub async fn load_usable<S: SettingsStore + ?Sized>(
        store: &S,
        provider: Provider,
    ) -> Result<Self> {
        let settings = store
            .active_settings()
            .await?
            .filter(|s| s.provider == provider)
            .ok_or(ConfigError::NotConfigured(provider))?;
        settings.ensure_usable().map_err(crate::error::IdentityError::from)?;
        Ok(settings)
    }
}

/// 配置读取接口
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// 返回当前活动配置，没有配置时返回 `None`
    async fn active_settings(&self) -> Result<Option<OAuth2Settings>>;
}

/// 数据库配置存储
pub struct DbSettingsStore {
    db: DatabaseConnection,
}

impl DbSettingsStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for DbSettingsStore {
    async fn active_settings(&self) -> Result<Option<OAuth2Settings>> {
        // 取最新一条记录作为活动配置
        let model = entity::OauthSettings::find()
            .order_by_desc(entity::oauth_settings::Column::Id)
            .one(&self.db)
            .await?;

        Ok(model.as_ref().and_then(OAuth2Settings::from_model))
    }
}
