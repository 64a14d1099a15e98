mod client;
mod room;
mod state;

use state::ServerState;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 42177;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on port {port}");

    let state = ServerState::default();
    loop {
        let (socket, _) = listener.accept().await?;

        tokio::spawn(client::handle_new_connection(state.clone(), socket));
    }
}
