use gugarden_server::{print_banner, setup_environment, Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, working directory, logging)
    setup_environment()?;

    print_banner();

    tracing::info!("Gugarden server starting...");

    // 2. Configuration
    let config = Config::from_env();

    // 3. Service graph
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server (run starts the background sweepers)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}
