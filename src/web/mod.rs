//! # HTTP 接口层
//!
//! OAuth 登录/绑定/回调/查询四个端点的 axum 路由与处理器

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::JwtManager;
use crate::error::{IdentityError, Result};
use crate::oauth::{AuthorizeUrlBuilder, CallbackOrchestrator, Provider};
use crate::users::IdentityResolver;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub authorize: Arc<AuthorizeUrlBuilder>,
    pub orchestrator: Arc<CallbackOrchestrator>,
    pub resolver: Arc<IdentityResolver>,
    pub jwt: Arc<JwtManager>,
}

/// 构建 OAuth 路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/oauth/{provider}/login", get(oauth_login))
        .route("/api/oauth/{provider}/bind", post(oauth_bind))
        .route("/api/oauth/{provider}/callback", get(oauth_callback))
        .route("/api/oauth/{provider}/info", get(oauth_bind_info))
        .with_state(state)
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();
        let body = Json(json!({
            "code": code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
    #[serde(default)]
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: String,
    #[serde(default)]
    state: String,
}

fn parse_provider(name: &str) -> Result<Provider> {
    Provider::parse(name).ok_or_else(|| crate::business_error!("不支持的OAuth提供商: {}", name))
}

/// 从 Authorization 头解析当前用户
async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<entity::users::Model> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| crate::auth_error!("缺少 Bearer token"))?;

    let claims = state.jwt.validate_token(token)?;
    state
        .resolver
        .find_user(claims.user_id)
        .await?
        .ok_or_else(|| crate::auth_error!("用户不存在"))
}

/// GET /api/oauth/{provider}/login
///
/// 返回登录授权地址，前端负责跳转。
async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<serde_json::Value>> {
    let provider = parse_provider(&provider)?;
    let url = state
        .authorize
        .login_url(provider, &query.redirect_uri)
        .await?;
    Ok(Json(json!({ "url": url })))
}

/// POST /api/oauth/{provider}/bind
///
/// 为当前登录用户生成绑定授权地址，仅管理员可用。
async fn oauth_bind(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<serde_json::Value>> {
    let provider = parse_provider(&provider)?;
    let user = current_user(&state, &headers).await?;
    let url = state
        .authorize
        .bind_url(provider, &user, &query.redirect_uri)
        .await?;
    Ok(Json(json!({ "url": url })))
}

/// GET /api/oauth/{provider}/callback
///
/// 提供商回跳入口，始终以 302 送回前端；
/// 编排器返回空串说明 state 不可信，此时只能回 400。
async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    if query.code.is_empty() || query.state.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "INVALID_PARAMS",
                "message": "缺少 code 或 state 参数",
            })),
        )
            .into_response();
    }

    let target = state
        .orchestrator
        .handle_callback(provider, &query.code, &query.state)
        .await;

    if target.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "STATE_INVALID",
                "message": "state无效",
            })),
        )
            .into_response();
    }

    Redirect::to(&target).into_response()
}

/// GET /api/oauth/{provider}/info
///
/// 查询当前用户在该提供商下的绑定情况，仅管理员可用。
async fn oauth_bind_info(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let provider = parse_provider(&provider)?;
    let user = current_user(&state, &headers).await?;
    let identity = state.resolver.bind_info(&user, provider).await?;

    let body = match identity {
        Some(identity) => json!({
            "bound": true,
            "provider": provider.as_str(),
            "external_id": identity.external_id,
            "created_at": identity.created_at,
        }),
        None => json!({
            "bound": false,
            "provider": provider.as_str(),
        }),
    };
    Ok(Json(body))
}
