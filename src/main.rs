//! Entry point for the mlpipe HTTP server.
use mlpipe::{config, logging, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let config = config::load()?;
    server::serve(config).await?;
    Ok(())
}
