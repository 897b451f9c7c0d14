use jumpcloud::JumpCloudProvider;
use tfplug::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServerConfig::default();

    // stdout carries the plugin handshake, so logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(config.log_level.to_tracing_level())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tfplug::serve(JumpCloudProvider::new(), config).await?;

    Ok(())
}
