use std::error::Error;
use std::sync::Arc;

use chatgate::chat_server::ChatServer;
use chatgate::clients::openai::OpenAIClient;
use chatgate::services::default_registry;
use chatgate::{Agent, ChatGateConfig, JsonlSessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    chatgate::init_logger();
    let config = ChatGateConfig::from_env();

    let api_key = match config.openai_api_key.as_deref() {
        Some(key) => key.to_string(),
        None => {
            log::warn!("OPENAI_API_KEY is not set; LLM requests will be rejected");
            String::new()
        }
    };

    let registry = default_registry(&config.services, config.http_timeout_secs).await?;
    for group in registry.group_names() {
        let names: Vec<&str> = registry
            .tools_in_group(group)
            .unwrap_or_default()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        log::info!("group '{}': {}", group, names.join(", "));
    }
    log::info!("{} tools loaded", registry.len());

    let client = OpenAIClient::new_with_service_timeout(
        &api_key,
        &config.model,
        &config.openai_base_url,
        config.http_timeout_secs,
    );
    let sessions = JsonlSessionStore::open(&config.session_dir)?;

    let agent = Agent::new(Arc::new(client), Arc::new(registry), Arc::new(sessions))
        .with_max_tool_iterations(config.max_tool_iterations);

    let server = ChatServer::start(&config.bind_addr, Arc::new(agent), config.default_session).await?;
    log::info!("chatgate ready on {}", server.get_addr());
    server.wait().await
}
