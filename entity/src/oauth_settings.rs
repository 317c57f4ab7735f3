//! # OAuth2 配置实体定义
//!
//! 系统同一时间只有一条活动配置，`provider` 字段标记其归属的提供商。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// OAuth2 提供商配置实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub redirect_uri: String,
    /// JSON 数组编码的 scope 列表
    pub scopes: String,
    pub enable: bool,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
