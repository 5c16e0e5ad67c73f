pub mod api;

use log::info;
use std::error::Error;

/// HTTP front for the relay and the catalog/monitor surfaces.
pub struct Server {
    addr: String,
    state: api::AppState,
}

impl Server {
    pub fn new(addr: String, state: api::AppState) -> Self {
        Self { addr, state }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| format!("Failed to bind {}: {}. Try a different port.", self.addr, e))?;
        info!("HTTP API server listening on: http://{}", self.addr);

        let app = api::router(self.state.clone());
        axum::serve(listener, app.into_make_service()).await?;

        Ok(())
    }
}
