use accesso::cli::{actions, actions::Action, start};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args and set up logging/telemetry
    let action = start()?;

    // Handle the action
    match action {
        Action::Server { .. } => actions::server::handle(action).await?,
    }

    Ok(())
}
