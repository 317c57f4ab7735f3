//! # 用户资料归一化
//!
//! 把各提供商的原始资料压成统一形态。归一化是全函数：
//! 任何输入都能产出可用的 [`CanonicalProfile`]，缺失的用户名用随机后缀兜底。

use crate::auth::state::random_string;
use crate::oauth::adapter::RawProfile;
use crate::oauth::adapters::custom::value_to_nonempty_string;
use crate::oauth::adapters::QqUser;
use crate::oauth::Provider;

/// 自定义型资料的用户名候选字段
const USERNAME_FIELDS: [&str; 4] = ["name", "username", "nickname", "display_name"];
/// 自定义型资料的头像候选字段
const AVATAR_FIELDS: [&str; 4] = ["avatar", "avatar_url", "picture", "photo"];

/// 归一化后的用户资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalProfile {
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// 归一化提供商原始资料
#[must_use]
pub fn normalize(provider: Provider, raw: &RawProfile) -> CanonicalProfile {
    let (username, email, avatar_url) = match raw {
        RawProfile::Github(user) => (
            nonempty(&user.login),
            user.email.clone().filter(|s| !s.is_empty()),
            user.avatar_url.clone().filter(|s| !s.is_empty()),
        ),
        RawProfile::Google(user) => {
            let email = user.email.clone().filter(|s| !s.is_empty());
            // name 缺失时用邮箱前缀当用户名
            let username = user
                .name
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    email
                        .as_deref()
                        .and_then(|e| e.split('@').next())
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                });
            (
                username,
                email,
                user.picture.clone().filter(|s| !s.is_empty()),
            )
        }
        RawProfile::Qq(user) => (nonempty(&user.nickname), None, qq_avatar(user)),
        RawProfile::Custom(body) => (
            USERNAME_FIELDS
                .iter()
                .find_map(|key| body.get(key).and_then(value_to_nonempty_string)),
            body.get("email").and_then(value_to_nonempty_string),
            AVATAR_FIELDS
                .iter()
                .find_map(|key| body.get(key).and_then(value_to_nonempty_string)),
        ),
    };

    CanonicalProfile {
        username: username.unwrap_or_else(|| default_username(provider)),
        email,
        avatar_url,
    }
}

/// 用户名缺失时的兜底：`<provider>_user_<随机6位>`
fn default_username(provider: Provider) -> String {
    format!("{}_user_{}", provider.as_str(), random_string(6))
}

fn nonempty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// QQ 头像按清晰度优先选取
fn qq_avatar(user: &QqUser) -> Option<String> {
    [
        &user.figureurl_qq_2,
        &user.figureurl_qq_1,
        &user.figureurl_2,
        &user.figureurl_1,
    ]
    .into_iter()
    .find(|url| !url.is_empty())
    .cloned()
}
