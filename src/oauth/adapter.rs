//! # 提供商适配器接口
//!
//! 每个提供商的差异被限制在各自的适配器实现内：
//! token 交换的 HTTP 形态、身份 ID 的获取路径、用户信息的响应结构。
//! 编排器只面对统一的 trait。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ExchangeError, ProfileError};
use crate::oauth::adapters::{
    CustomAdapter, GithubAdapter, GithubUser, GoogleAdapter, GoogleUser, QqAdapter, QqUser,
};
use crate::oauth::{OAuth2Settings, Provider};

/// 提供商返回的原始用户资料
///
/// 保留提供商各自的结构，归一化交给 [`crate::oauth::profile::normalize`]。
#[derive(Debug, Clone)]
pub enum RawProfile {
    Github(GithubUser),
    Google(GoogleUser),
    Qq(QqUser),
    Custom(serde_json::Value),
}

/// 提供商适配器
///
/// `exchange_code` 用授权码换访问令牌；`fetch_profile` 返回
/// (外部身份 ID, 原始资料)。两步的失败类型不同，编排器据此生成错误信息。
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    async fn exchange_code(
        &self,
        settings: &OAuth2Settings,
        code: &str,
    ) -> std::result::Result<String, ExchangeError>;

    async fn fetch_profile(
        &self,
        settings: &OAuth2Settings,
        access_token: &str,
    ) -> std::result::Result<(String, RawProfile), ProfileError>;
}

/// 构建带超时的共享 HTTP 客户端
#[must_use]
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// 适配器注册表
///
/// 提供商集合封闭，注册表仍允许替换实现（测试中指向 mock 服务）。
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// 注册全部内置适配器
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
        };
        registry.insert(Arc::new(GithubAdapter::new()));
        registry.insert(Arc::new(GoogleAdapter::new()));
        registry.insert(Arc::new(QqAdapter::new()));
        registry.insert(Arc::new(CustomAdapter::new()));
        registry
    }

    pub fn insert(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
