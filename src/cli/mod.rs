use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP API server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Per-second request allowance for the chat endpoint. 0 disables limiting.
    #[arg(long, env = "CHAT_RATE_LIMIT", default_value = "0")]
    pub chat_rate_limit: u32,

    // --- Upstream Gateway Args ---
    /// API key for the hosted chat-completion gateway. Chat requests are
    /// refused with a configuration error while this is unset.
    #[arg(long, env = "GATEWAY_API_KEY")]
    pub gateway_api_key: Option<String>,

    /// Chat-completions URL of the upstream gateway (OpenAI-compatible).
    #[arg(long, env = "GATEWAY_BASE_URL")]
    pub gateway_base_url: Option<String>,

    /// Model identifier sent with every completion request.
    #[arg(long, env = "GATEWAY_MODEL")]
    pub gateway_model: Option<String>,

    // --- Content Args ---
    /// Path to the persona/prompt configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Path to the papers seed file loaded into the catalog at startup.
    #[arg(long, env = "PAPERS_SEED_PATH", default_value = "json/papers.json")]
    pub papers_seed_path: String,

    // --- Data Store Args ---
    /// Catalog store type (memory, none).
    #[arg(long, env = "STORE_TYPE", default_value = "memory")]
    pub store_type: String,

    // --- Gated Surface Args ---
    /// Shared secret for the admin paper endpoints. Unset keeps them closed.
    #[arg(long, env = "ADMIN_SECRET", default_value = "")]
    pub admin_secret: String,

    /// Shared secret for the usage-monitor endpoint. Unset keeps it closed.
    #[arg(long, env = "MONITOR_SECRET", default_value = "")]
    pub monitor_secret: String,
}
