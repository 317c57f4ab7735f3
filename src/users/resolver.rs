//! # 身份解析器
//!
//! 外部身份到本地用户的解析与绑定。
//! 登录解析是幂等的：同一外部身份多次回调命中同一个本地用户，
//! 并发首登依赖唯一约束裁决，落败方重查后返回胜者创建的用户。

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::state::random_string;
use crate::error::{ConflictError, IdentityError, PermissionError, Result};
use crate::oauth::{CanonicalProfile, Provider};
use crate::users::store::{NewOAuthUser, UserStore};

/// 绑定失败的两种去向：冲突走专用提示，其余按存储错误处理
#[derive(Debug, Error)]
pub enum ResolveBindError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Store(#[from] IdentityError),
}

/// 身份解析器
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// 登录解析：已绑定直接返回用户，未绑定自动注册并绑定
    pub async fn resolve_login(
        &self,
        provider: Provider,
        external_id: &str,
        profile: &CanonicalProfile,
    ) -> Result<entity::users::Model> {
        if let Some(user) = self
            .store
            .find_by_external_identity(provider, external_id)
            .await?
        {
            return Ok(user);
        }

        // 用户名撞库只补救一次，随机后缀再撞属于异常情况，交给唯一约束报错
        let mut username = profile.username.clone();
        if self.store.find_by_username(&username).await?.is_some() {
            username = format!("{}_{}", username, random_string(6));
        }

        let password_hash = bcrypt::hash(random_string(32), bcrypt::DEFAULT_COST)?;
        let new_user = NewOAuthUser {
            username,
            password_hash,
            avatar_url: profile.avatar_url.clone().unwrap_or_default(),
            provider,
            external_id: external_id.to_string(),
        };

        match self.store.create_user_with_identity(new_user).await {
            Ok(user) => {
                info!(
                    provider = %provider,
                    user_id = user.id,
                    "OAuth 自动注册新用户"
                );
                Ok(user)
            }
            // 提交时的唯一冲突意味着并发回调已抢先注册，重查即可
            Err(e) if e.is_conflict() => {
                warn!(provider = %provider, "并发注册冲突，重查已有绑定");
                self.store
                    .find_by_external_identity(provider, external_id)
                    .await?
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// 绑定解析：为已登录用户建立外部身份绑定
    ///
    /// 重复绑定到同一用户视为成功；绑定到他人则报冲突。
    pub async fn resolve_bind(
        &self,
        provider: Provider,
        external_id: &str,
        user_id: i32,
    ) -> std::result::Result<(), ResolveBindError> {
        if let Some(identity) = self.store.find_identity(provider, external_id).await? {
            if identity.user_id == user_id {
                return Ok(());
            }
            return Err(ConflictError {
                provider,
                external_id: external_id.to_string(),
                bound_user_id: identity.user_id,
            }
            .into());
        }

        match self.store.bind_identity(user_id, provider, external_id).await {
            Ok(()) => Ok(()),
            // 并发绑定在唯一约束处落败：重查以区分幂等成功与真实冲突
            Err(e) if e.is_conflict() => {
                match self.store.find_identity(provider, external_id).await? {
                    Some(identity) if identity.user_id == user_id => Ok(()),
                    Some(identity) => Err(ConflictError {
                        provider,
                        external_id: external_id.to_string(),
                        bound_user_id: identity.user_id,
                    }
                    .into()),
                    None => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 查询绑定信息，仅管理员可见
    pub async fn bind_info(
        &self,
        user: &entity::users::Model,
        provider: Provider,
    ) -> Result<Option<entity::oauth_identities::Model>> {
        if !user.is_admin {
            return Err(PermissionError { provider }.into());
        }
        self.store.find_identity_for_user(user.id, provider).await
    }

    pub async fn find_user(&self, user_id: i32) -> Result<Option<entity::users::Model>> {
        self.store.find_by_id(user_id).await
    }
}
