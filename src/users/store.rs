//! # 用户存储
//!
//! 用户表与外部身份表的数据库访问。
//! 建用户与建绑定必须同事务提交，数据库唯一约束是并发下的最终仲裁。

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::error::Result;
use crate::oauth::Provider;

/// OAuth 自动注册的新用户
#[derive(Debug, Clone)]
pub struct NewOAuthUser {
    pub username: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub provider: Provider,
    pub external_id: String,
}

/// 用户与身份绑定的存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<entity::users::Model>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<entity::users::Model>>;

    /// 按 (provider, external_id) 查绑定记录
    async fn find_identity(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<entity::oauth_identities::Model>>;

    /// 查某用户在某提供商下的绑定记录
    async fn find_identity_for_user(
        &self,
        user_id: i32,
        provider: Provider,
    ) -> Result<Option<entity::oauth_identities::Model>>;

    /// 按外部身份解析本地用户
    async fn find_by_external_identity(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<entity::users::Model>>;

    /// 原子地创建用户并建立绑定
    ///
    /// 并发冲突由唯一约束在提交时裁决，表现为 conflict 类错误。
    async fn create_user_with_identity(&self, new_user: NewOAuthUser)
        -> Result<entity::users::Model>;

    /// 为已有用户建立绑定
    async fn bind_identity(
        &self,
        user_id: i32,
        provider: Provider,
        external_id: &str,
    ) -> Result<()>;
}

/// 数据库用户存储
pub struct DbUserStore {
    db: DatabaseConnection,
}

impl DbUserStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for DbUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<entity::users::Model>> {
        Ok(entity::Users::find_by_id(user_id).one(&self.db).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<entity::users::Model>> {
        Ok(entity::Users::find()
            .filter(entity::users::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn find_identity(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<entity::oauth_identities::Model>> {
        Ok(entity::OauthIdentities::find()
            .filter(entity::oauth_identities::Column::Provider.eq(provider.as_str()))
            .filter(entity::oauth_identities::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?)
    }

    async fn find_identity_for_user(
        &self,
        user_id: i32,
        provider: Provider,
    ) -> Result<Option<entity::oauth_identities::Model>> {
        Ok(entity::OauthIdentities::find()
            .filter(entity::oauth_identities::Column::UserId.eq(user_id))
            .filter(entity::oauth_identities::Column::Provider.eq(provider.as_str()))
            .one(&self.db)
            .await?)
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
        let txn = self.db.begin().await?;
        let now = Utc::now().naive_utc();

        let user = entity::users::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            is_admin: Set(false),
            avatar_url: Set(new_user.avatar_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        entity::oauth_identities::ActiveModel {
            user_id: Set(user.id),
            provider: Set(new_user.provider.as_str().to_string()),
            external_id: Set(new_user.external_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(user)
    }

    async fn bind_identity(
        &self,
        user_id: i32,
        provider: Provider,
        external_id: &str,
    ) -> Result<()> {
        entity::oauth_identities::ActiveModel {
            user_id: Set(user_id),
            provider: Set(provider.as_str().to_string()),
            external_id: Set(external_id.to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}
