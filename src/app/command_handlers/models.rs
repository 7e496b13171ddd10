use crate::app::command_support::{success, CommandContext};
use crate::ollama::OllamaClient;
use crate::render::ChatView;
use tracing::info;

pub fn cmd_download_model(context: &CommandContext, model: &str) -> Result<String, String> {
    let client = context.model_client();
    let mut view = context.view()?;
    view.begin_progress(model).map_err(|e| e.to_string())?;
    let result = pull_into_view(&client, &mut view, model);
    view.finish_progress().map_err(|e| e.to_string())?;
    result?;
    info!(model, "model downloaded");
    Ok(success(format!("{model} was successfully downloaded!")))
}

fn pull_into_view(
    client: &OllamaClient,
    view: &mut ChatView,
    model: &str,
) -> Result<(), String> {
    let mut succeeded = false;
    for event in client.pull_model(model).map_err(|e| e.to_string())? {
        let event = event.map_err(|e| e.to_string())?;
        succeeded |= event.is_success();
        view.update_progress(&event).map_err(|e| e.to_string())?;
    }
    if !succeeded {
        return Err(format!("download of {model} ended before it completed"));
    }
    Ok(())
}

pub fn cmd_remove_model(context: &CommandContext, model: &str) -> Result<String, String> {
    context
        .model_client()
        .delete_model(model)
        .map_err(|e| format!("{model} was not removed: {e}"))?;
    info!(model, "model removed");
    Ok(success(format!("{model} was successfully removed!")))
}

pub fn cmd_list_models(context: &CommandContext) -> Result<String, String> {
    let models = context
        .model_client()
        .list_models()
        .map_err(|e| e.to_string())?;
    if models.is_empty() {
        return Ok("No models downloaded.".to_string());
    }
    Ok(models
        .iter()
        .map(|model| model.identifier().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn cmd_show_model(context: &CommandContext, model: &str) -> Result<String, String> {
    let details = context
        .model_client()
        .show_model(model)
        .map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&details).map_err(|e| format!("failed to format model details: {e}"))
}
