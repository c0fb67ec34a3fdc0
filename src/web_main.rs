//! Web 服务器主程序入口

use std::sync::Arc;

use clap::Parser;

use wordswap::core::{open_http_proxy, ProxyOptions};
use wordswap::env::init_tracing;
use wordswap::web::{WebConfig, WebServer};

/// Wordswap Web Server
#[derive(Parser)]
#[command(name = "wordswap-web")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address [default: 127.0.0.1]
    #[arg(short, long)]
    bind: Option<String>,

    /// Port number [default: 7080]
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut web_config = WebConfig::default();
    if let Some(bind) = args.bind {
        web_config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        web_config.port = port;
    }
    web_config.validate()?;

    let options = ProxyOptions::default();
    options.validate()?;

    // 阻塞 HTTP 客户端不能在异步上下文中创建或销毁，所以在运行时之外持有它
    let proxy = Arc::new(open_http_proxy(options)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let server = WebServer::new(web_config, proxy.clone());
    runtime.block_on(server.start())?;
    drop(server);
    drop(runtime);

    Ok(())
}
