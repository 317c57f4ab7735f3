//! 回调编排端到端场景：登录、绑定与各类失败的重定向结果

mod common;

use std::sync::Arc;

use url::Url;

use common::{InMemoryUserStore, StaticSettingsStore, StubAdapter, StubTokenIssuer, test_settings};
use identity_hub::auth::{OAuthAction, StateCodec};
use identity_hub::oauth::adapter::AdapterRegistry;
use identity_hub::oauth::{CallbackOrchestrator, Provider};
use identity_hub::users::IdentityResolver;

const SECRET: &str = "callback-flow-test-secret-0123456789";
const REDIRECT: &str = "https://app.test/auth/done";

struct Harness {
    codec: Arc<StateCodec>,
    orchestrator: CallbackOrchestrator,
    store: Arc<InMemoryUserStore>,
}

fn harness_with(adapter: StubAdapter, settings: StaticSettingsStore, issuer_fails: bool) -> Harness {
    let codec = Arc::new(StateCodec::new(SECRET, 600));
    let store = Arc::new(InMemoryUserStore::new());
    let resolver = Arc::new(IdentityResolver::new(store.clone()));

    let mut adapters = AdapterRegistry::with_defaults();
    adapters.insert(Arc::new(adapter));

    let orchestrator = CallbackOrchestrator::new(
        codec.clone(),
        Arc::new(settings),
        Arc::new(adapters),
        resolver,
        Arc::new(StubTokenIssuer { fail: issuer_fails }),
    );

    Harness {
        codec,
        orchestrator,
        store,
    }
}

fn harness() -> Harness {
    harness_with(
        StubAdapter::github("gh-1001", "octocat"),
        StaticSettingsStore::with(test_settings(Provider::Github)),
        false,
    )
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn login_callback_redirects_with_token() {
    let h = harness();
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;

    assert!(target.starts_with(REDIRECT));
    let token = query_param(&target, "token").unwrap();
    assert!(token.starts_with("token-"));

    // 用户已自动注册
    assert_eq!(h.store.users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn forged_state_yields_empty_redirect() {
    let h = harness();
    let other = StateCodec::new("a-different-secret-entirely-123456", 600);
    let state = other
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(target, "");
}

#[tokio::test]
async fn state_for_other_provider_yields_empty_redirect() {
    let h = harness();
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Google)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(target, "");
}

#[tokio::test]
async fn missing_settings_redirects_with_config_error() {
    let h = harness_with(
        StubAdapter::github("gh-1001", "octocat"),
        StaticSettingsStore::empty(),
        false,
    );
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(query_param(&target, "error").as_deref(), Some("OAuth配置错误"));
}

#[tokio::test]
async fn exchange_failure_redirects_with_error() {
    let mut adapter = StubAdapter::github("gh-1001", "octocat");
    adapter.fail_exchange = true;
    let h = harness_with(
        adapter,
        StaticSettingsStore::with(test_settings(Provider::Github)),
        false,
    );
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    let error = query_param(&target, "error").unwrap();
    assert!(error.contains("token 交换失败"));
}

#[tokio::test]
async fn token_issue_failure_redirects_with_error() {
    let h = harness_with(
        StubAdapter::github("gh-1001", "octocat"),
        StaticSettingsStore::with(test_settings(Provider::Github)),
        true,
    );
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(query_param(&target, "error").as_deref(), Some("生成token失败"));
}

#[tokio::test]
async fn login_state_with_user_id_is_rejected() {
    let h = harness();
    // login 意图却携带已登录用户，属非法组合
    let state = h
        .codec
        .encode(OAuthAction::Login, 7, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(target, "");
}

#[tokio::test]
async fn bind_callback_attaches_identity() {
    let h = harness();
    let admin = h.store.seed_user("admin", true);
    let state = h
        .codec
        .encode(OAuthAction::Bind, admin.id, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;

    assert_eq!(query_param(&target, "bind").as_deref(), Some("success"));
    let identities = h.store.identities.lock().unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].user_id, admin.id);
}

#[tokio::test]
async fn bind_conflict_redirects_with_bind_error() {
    let h = harness();
    let owner = h.store.seed_user("owner", false);
    let admin = h.store.seed_user("admin", true);
    h.store.seed_identity(owner.id, Provider::Github, "gh-1001");

    let state = h
        .codec
        .encode(OAuthAction::Bind, admin.id, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;

    assert_eq!(query_param(&target, "bind").as_deref(), Some("error"));
    assert_eq!(
        query_param(&target, "error").as_deref(),
        Some("该账号已被其他用户绑定")
    );
}

#[tokio::test]
async fn bind_state_without_user_id_is_rejected() {
    let h = harness();
    let state = h
        .codec
        .encode(OAuthAction::Bind, 0, REDIRECT, Provider::Github)
        .unwrap();

    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE", &state)
        .await;
    assert_eq!(target, "");
}

#[tokio::test]
async fn code_fragment_is_stripped_before_exchange() {
    let h = harness();
    let state = h
        .codec
        .encode(OAuthAction::Login, 0, REDIRECT, Provider::Github)
        .unwrap();

    // 授权码带 fragment 也能完成登录
    let target = h
        .orchestrator
        .handle_callback(Provider::Github, "CODE#_=_", &state)
        .await;
    assert!(query_param(&target, "token").is_some());
}
