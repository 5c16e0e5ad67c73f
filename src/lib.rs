pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod llm;
pub mod models;
pub mod monitor;
pub mod server;
pub mod settings;
pub mod store;

use std::error::Error;
use std::sync::Arc;

use log::{info, warn};

use auth::SharedSecretVerifier;
use catalog::CatalogService;
use cli::Args;
use monitor::UsageStats;
use server::api::AppState;
use server::Server;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!(
        "Gateway Credential Present: {}",
        args.gateway_api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    );
    info!("Gateway Model: {}", args.gateway_model.as_deref().unwrap_or("adapter default"));
    info!("Gateway Base URL: {}", args.gateway_base_url.as_deref().unwrap_or("adapter default"));
    info!("Prompts Path: {}", args.prompts_path);
    info!("Store Type: {}", args.store_type);
    info!("Papers Seed Path: {}", args.papers_seed_path);
    info!("Chat Rate Limit: {}", args.chat_rate_limit);
    info!("-------------------------");

    let state = build_state(&args).await?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state);
    server.run().await?;

    Ok(())
}

/// Assembles the shared application state from configuration. Absent
/// capabilities (gateway credential, catalog store) stay `None` and the
/// affected endpoints answer with a configuration error instead of a
/// silently degraded stand-in.
pub async fn build_state(args: &Args) -> Result<AppState, Box<dyn Error + Send + Sync>> {
    let gateway = llm::new_gateway(args);
    if gateway.is_none() {
        warn!("No gateway credential configured; chat requests will be refused.");
    }

    let prompts = config::prompt::load_prompts_or_default(&args.prompts_path);

    let catalog = match store::create_data_store(args)? {
        Some(data_store) => {
            let catalog = CatalogService::new(data_store);
            catalog.seed_from_file(&args.papers_seed_path).await?;
            Some(catalog)
        }
        None => {
            warn!("Catalog store disabled; paper endpoints will answer with a configuration error.");
            None
        }
    };

    Ok(AppState {
        gateway,
        prompts,
        catalog,
        admin_gate: Arc::new(SharedSecretVerifier::new(args.admin_secret.clone())),
        monitor_gate: Arc::new(SharedSecretVerifier::new(args.monitor_secret.clone())),
        usage: Arc::new(UsageStats::new()),
        limiter: server::api::chat_limiter(args.chat_rate_limit),
    })
}
