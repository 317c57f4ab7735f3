//! # 内置提供商适配器
//!
//! 四种行为模式各占一个文件，wire 结构体随适配器就近定义。

pub mod custom;
pub mod github;
pub mod google;
pub mod qq;

pub use custom::CustomAdapter;
pub use github::{GithubAdapter, GithubUser};
pub use google::{GoogleAdapter, GoogleUser};
pub use qq::{QqAdapter, QqUser};
