//! # OAuth 模块
//!
//! 联合身份解析子系统的核心：提供商适配、配置校验、
//! 授权 URL 构建、用户资料归一化与回调编排。

pub mod adapter;
pub mod adapters;
pub mod authorize;
pub mod callback;
pub mod profile;
pub mod settings;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use adapter::{AdapterRegistry, ProviderAdapter, RawProfile};
pub use authorize::AuthorizeUrlBuilder;
pub use callback::CallbackOrchestrator;
pub use profile::CanonicalProfile;
pub use settings::{OAuth2Settings, SettingsStore};

/// 支持的 OAuth2 提供商（封闭集合）
///
/// 四种行为模式：GitHub 型（JSON POST 换 token）、Google 型（form POST）、
/// QQ 型（GET 换 token、二段式身份获取）、自定义型（字段探测）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Google,
    Qq,
    Custom,
}

impl Provider {
    pub const ALL: [Self; 4] = [Self::Github, Self::Google, Self::Qq, Self::Custom];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
            Self::Qq => "qq",
            Self::Custom => "custom",
        }
    }

    /// 解析提供商名称，未知名称返回 `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "github" => Some(Self::Github),
            "google" => Some(Self::Google),
            "qq" => Some(Self::Qq),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
