//! Binary entry point for the waterlog map API server.

use waterlog_map_server::config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    waterlog_map_server::run(config).await
}
