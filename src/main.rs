// ==========================================
// 工单流转追踪系统 - HTTP 服务主入口
// ==========================================

use std::sync::Arc;

use trackii_wip::app::{build_router, AppState};
use trackii_wip::config::AppConfig;
use trackii_wip::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", trackii_wip::APP_NAME);
    tracing::info!("系统版本: {}", trackii_wip::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env()?;
    tracing::info!("使用数据库: {}", config.db_path);

    let db_path = config.db_path.clone();
    let app_state = tokio::task::spawn_blocking(move || AppState::new(db_path))
        .await?
        .map_err(|e| anyhow::anyhow!("无法初始化AppState: {}", e))?;

    let app = build_router(Arc::new(app_state));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("HTTP 服务已启动: {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP 服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭...");
}
