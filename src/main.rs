//! # 服务入口
//!
//! 加载配置、初始化日志与数据库，装配 OAuth 组件并启动 HTTP 服务

use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use tracing::info;

use identity_hub::auth::JwtManager;
use identity_hub::config::AppConfig;
use identity_hub::error::{Context, Result};
use identity_hub::oauth::settings::DbSettingsStore;
use identity_hub::oauth::{AdapterRegistry, AuthorizeUrlBuilder, CallbackOrchestrator};
use identity_hub::users::{DbUserStore, IdentityResolver};
use identity_hub::web::{AppState, router};
use identity_hub::{StateCodec, logging};

#[derive(Parser, Debug)]
#[command(name = "identity-hub", about = "联合 OAuth2 身份解析服务", version)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// 日志级别 (trace/debug/info/warn/error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// 覆盖监听端口
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level.as_deref());

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let mut options = ConnectOptions::new(config.database.url.clone());
    options.max_connections(config.database.max_connections);
    let db = Database::connect(options)
        .await
        .context("数据库连接失败")?;

    Migrator::up(&db, None).await.context("数据库迁移失败")?;
    info!("数据库就绪: {}", config.database.url);

    let codec = Arc::new(StateCodec::new(
        &config.auth.jwt_secret,
        config.auth.state_ttl_secs,
    ));
    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expires_in,
    ));
    let settings = Arc::new(DbSettingsStore::new(db.clone()));
    let store = Arc::new(DbUserStore::new(db));
    let resolver = Arc::new(IdentityResolver::new(store));
    let adapters = Arc::new(AdapterRegistry::with_defaults());

    let state = AppState {
        authorize: Arc::new(AuthorizeUrlBuilder::new(codec.clone(), settings.clone())),
        orchestrator: Arc::new(CallbackOrchestrator::new(
            codec,
            settings,
            adapters,
            resolver.clone(),
            jwt.clone(),
        )),
        resolver,
        jwt,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {addr}"))?;
    info!("HTTP 服务启动: {addr}");

    axum::serve(listener, router(state))
        .await
        .context("HTTP 服务异常退出")?;

    Ok(())
}
