//! OAuth state（意图令牌）安全性质测试

use identity_hub::auth::{NO_USER, OAuthAction, StateCodec};
use identity_hub::error::StateError;
use identity_hub::oauth::Provider;
use pretty_assertions::assert_eq;

fn codec() -> StateCodec {
    StateCodec::new("integration-test-secret-0123456789", 600)
}

#[test]
fn state_roundtrip_preserves_intent() {
    let codec = codec();
    for provider in Provider::ALL {
        let token = codec
            .encode(OAuthAction::Bind, 42, "https://app.test/settings", provider)
            .unwrap();
        let state = codec.decode(&token, provider).unwrap();

        assert_eq!(state.action, OAuthAction::Bind);
        assert_eq!(state.user_id, 42);
        assert_eq!(state.redirect, "https://app.test/settings");
        assert_eq!(state.provider, provider.as_str());
    }
}

#[test]
fn state_nonces_are_unique_per_encode() {
    let codec = codec();
    let a = codec
        .encode(OAuthAction::Login, NO_USER, "", Provider::Github)
        .unwrap();
    let b = codec
        .encode(OAuthAction::Login, NO_USER, "", Provider::Github)
        .unwrap();
    // nonce 不同导致令牌不同
    assert_ne!(a, b);

    let sa = codec.decode(&a, Provider::Github).unwrap();
    let sb = codec.decode(&b, Provider::Github).unwrap();
    assert_ne!(sa.nonce, sb.nonce);
}

#[test]
fn tampered_payload_is_rejected() {
    let codec = codec();
    let token = codec
        .encode(OAuthAction::Login, NO_USER, "https://app.test/cb", Provider::Github)
        .unwrap();

    // 篡改载荷段后签名必然失效
    let mut parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    let forged_payload = "eyJhY3Rpb24iOiJsb2dpbiIsInVzZXJfaWQiOjk5OX0";
    parts[1] = forged_payload;
    let forged = parts.join(".");

    let err = codec.decode(&forged, Provider::Github).unwrap_err();
    assert!(matches!(err, StateError::InvalidSignature(_)));
}

#[test]
fn state_is_bound_to_its_provider() {
    let codec = codec();
    let token = codec
        .encode(OAuthAction::Login, NO_USER, "https://app.test/cb", Provider::Google)
        .unwrap();

    for other in [Provider::Github, Provider::Qq, Provider::Custom] {
        let err = codec.decode(&token, other).unwrap_err();
        assert!(matches!(err, StateError::ProviderMismatch { .. }));
    }
}

#[test]
fn garbage_token_is_rejected() {
    let codec = codec();
    assert!(codec.decode("", Provider::Github).is_err());
    assert!(codec.decode("not.a.jwt", Provider::Github).is_err());
}
