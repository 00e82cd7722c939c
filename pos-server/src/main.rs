use pos_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env (可选)
    let _ = dotenv::dotenv();

    // 2. 加载配置并准备工作目录
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    // 3. 日志 (guard 需存活到进程结束)
    let log_dir = config.log_dir();
    let _guard = init_logger_with_file(
        Some(config.log_level.as_str()),
        config.log_json,
        log_dir.to_str(),
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        timezone = %config.timezone,
        "🦀 POS server starting..."
    );

    // 4. 启动 HTTP 服务器 (初始化状态、后台任务，Ctrl+C 优雅退出)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
