use anyhow::Result;
use auto_blog_publish::orchestrator::App;
use auto_blog_publish::utils::logging;
use auto_blog_publish::Config;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用（HTTP 触发端点 + 定时循环）
    let app = Arc::new(App::initialize(config).await?);
    app.serve().await?;

    Ok(())
}
