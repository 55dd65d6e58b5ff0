use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use image_stacker::server::{self, AppState};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Turn debug logging on
    #[arg(short, long)]
    debug: bool,

    /// Address to bind the server to
    #[arg(short, long, value_name = "ADDR", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Timeout for downloading a single image, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    fetch_timeout: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.fetch_timeout))
        .build()
        .expect("failed to build http client");

    let listener = TcpListener::bind(args.listen).await.expect("bind error");
    log::info!("Listening on http://{}", args.listen);
    log::info!("Try it:");
    log::info!(
        "  curl -X POST http://{}/api/stack-images -H 'Content-Type: application/json' \
         -d '{{\"images\": [\"https://example.com/a.png\", \"https://example.com/b.png\"]}}'",
        args.listen
    );

    axum::serve(listener, server::app(AppState::new(client)).into_make_service())
        .await
        .expect("server error");
}
