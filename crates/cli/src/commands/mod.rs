//! CLI subcommands and the helpers they share.

pub mod ask;
pub mod config_cmd;
pub mod context;
pub mod doctor;
pub mod onboard;
pub mod plan;
pub mod stats;
pub mod topics;

use pagewise_agent::ContextBudget;
use pagewise_config::AppConfig;
use pagewise_core::Document;
use std::error::Error;
use std::future::Future;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Run `work` with a token that is cancelled on Ctrl+C.
pub(crate) async fn with_ctrl_c<T, F, Fut>(work: F) -> T
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = T>,
{
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Cancelling...");
            trigger.cancel();
        }
    });
    let result = work(cancel).await;
    watcher.abort();
    result
}

/// Load a document; Ctrl+C stops extraction between page batches.
pub(crate) async fn load_document(
    file: &Path,
    config: &AppConfig,
) -> Result<Document, Box<dyn Error>> {
    if !file.is_file() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    let document = with_ctrl_c(|cancel| async move {
        pagewise_ingest::load_document_cancellable(file, &config.extraction, &cancel).await
    })
    .await?;
    Ok(document)
}

pub(crate) fn budget(config: &AppConfig, max_tokens: Option<usize>) -> ContextBudget {
    ContextBudget::from_tokens(max_tokens.unwrap_or(config.context.max_tokens))
}
