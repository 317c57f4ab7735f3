//! # 用户实体定义
//!
//! 本地用户表的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 本地用户实体
///
/// OAuth 自动注册的用户 `password_hash` 为随机占位值，不用于密码登录。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub avatar_url: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::oauth_identities::Entity")]
    OauthIdentities,
}

impl Related<super::oauth_identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OauthIdentities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
