//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod oauth_identities;
pub mod oauth_settings;
pub mod users;

pub use oauth_identities::Entity as OauthIdentities;
pub use oauth_settings::Entity as OauthSettings;
pub use users::Entity as Users;
