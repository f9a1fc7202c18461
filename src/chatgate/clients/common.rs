use crate::chatgate::client_wrapper::TokenUsage;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::error::Error;
use std::sync::Mutex;

/// Issue one chat completion, store its usage in `usage_slot` and return the
/// first choice's text.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let request = chat::ChatArguments::new(model, formatted_msgs);
    let completion = api.create_chat(request, url_path).await.map_err(|err| {
        log::error!("chat completion against model '{}' failed: {}", model, err);
        err.to_string()
    })?;

    if let Ok(mut slot) = usage_slot.lock() {
        *slot = Some(TokenUsage {
            input_tokens: completion.usage.prompt_tokens as usize,
            output_tokens: completion.usage.completion_tokens as usize,
            total_tokens: completion.usage.total_tokens as usize,
        });
    }

    completion
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .ok_or_else(|| "chat completion returned no choices".into())
}
