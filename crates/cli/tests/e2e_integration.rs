//! End-to-end tests for the Pagewise document pipeline.
//!
//! These run a source file through ingestion, context assembly and the
//! retry controller against a scripted completion provider.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pagewise_agent::{APOLOGY, AssemblyTier, ContextBudget, DocumentAssistant, StudyPlanner};
use pagewise_config::AppConfig;
use pagewise_core::error::{AskError, ProviderError};
use pagewise_core::message::Message;
use pagewise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use pagewise_core::Document;
use tokio_util::sync::CancellationToken;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Replays scripted results in order, then repeats the last one.
struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn text(answer: &str) -> Self {
        Self::new(vec![Ok(text_response(answer))])
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn system_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.system_prompt().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().expect("ScriptedProvider has an empty script")
        }
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: None,
        model: "mock-model".into(),
    }
}

fn too_large() -> ProviderError {
    ProviderError::ApiError {
        status_code: 400,
        message: "Request exceeds the maximum context length".into(),
    }
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn load(path: &PathBuf) -> Document {
    pagewise_ingest::load_document(path, &AppConfig::default().extraction).await
}

/// `count` long filler sections; the short one at `hit` is about mitochondria.
fn lecture_notes(count: usize, hit: usize) -> String {
    (0..count)
        .map(|i| {
            if i == hit {
                format!("Part {i}\nMitochondria produce energy for the cell by respiration.")
            } else {
                format!("Part {i}\n{}", "lorem ipsum dolor sit amet ".repeat(19))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Small documents ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn small_text_file_is_sent_whole() {
    let dir = tempfile::tempdir().unwrap();
    let notes = "Osmosis\n\nWater moves across a membrane toward higher solute concentration.";
    let path = write_file(&dir, "notes.txt", notes);

    let provider = Arc::new(ScriptedProvider::text("Toward higher solute concentration."));
    let assistant = DocumentAssistant::new(provider.clone(), &AppConfig::default());

    let document = load(&path).await;
    let answer = assistant.ask(&document, "Which way does water move?").await.unwrap();

    assert_eq!(answer, "Toward higher solute concentration.");
    assert_eq!(provider.calls(), 1);
    assert!(provider.system_prompts()[0].ends_with(notes));
}

// ── Large documents ──────────────────────────────────────────────────────

#[tokio::test]
async fn large_file_context_keeps_the_relevant_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "lecture.txt", &lecture_notes(200, 150));

    let assistant = DocumentAssistant::new(
        Arc::new(ScriptedProvider::text("unused")),
        &AppConfig::default(),
    );
    let document = load(&path).await;
    let budget = ContextBudget::from_tokens(4_000);
    let assembled =
        assistant.assemble_context(&document, "How do mitochondria produce energy?", budget);

    assert_eq!(assembled.tier, AssemblyTier::Relevance);
    assert_eq!(assembled.total_sections, 200);
    assert!(assembled.text.starts_with("Part 0\n"));
    assert!(assembled.text.contains("Mitochondria produce energy"));
    assert!(assembled.text.chars().count() <= budget.max_chars);
}

#[tokio::test]
async fn large_file_without_matches_falls_back_to_head_and_tail() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "lecture.txt", &lecture_notes(200, usize::MAX));

    let assistant = DocumentAssistant::new(
        Arc::new(ScriptedProvider::text("unused")),
        &AppConfig::default(),
    );
    let document = load(&path).await;
    let assembled =
        assistant.assemble_context(&document, "photosynthesis", ContextBudget::from_tokens(4_000));

    assert_eq!(assembled.tier, AssemblyTier::HeadTail);
    assert!(assembled.text.starts_with("Part 0\n"));
    assert!(assembled.text.contains("Part 199"));
}

// ── Retry protocol ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn oversized_requests_are_retried_with_less_content() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(too_large()),
        Err(too_large()),
        Ok(text_response("Respiration.")),
    ]));
    let assistant = DocumentAssistant::new(provider.clone(), &AppConfig::default());
    let context = "cell ".repeat(2_000);

    let answer = assistant
        .ask_with_context(&context, "How is energy produced?")
        .await
        .unwrap();

    assert_eq!(answer, "Respiration.");
    assert_eq!(provider.calls(), 3);
    let prompts = provider.system_prompts();
    assert!(prompts[1].len() < prompts[0].len());
    assert!(prompts[2].len() < prompts[1].len());
}

#[tokio::test(start_paused = true)]
async fn persistent_size_failures_end_in_apology() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(too_large())]));
    let assistant = DocumentAssistant::new(provider.clone(), &AppConfig::default());

    let outcome = assistant
        .ask_with_context_cancellable(&"cell ".repeat(2_000), "q", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.answer, APOLOGY);
    assert!(outcome.exhausted);
    assert_eq!(provider.calls(), 4);
    assert!(provider.system_prompts()[3].contains("Only a short excerpt"));
}

#[tokio::test(start_paused = true)]
async fn unclassified_failure_is_returned_without_retry() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(
        ProviderError::AuthenticationFailed("bad key".into()),
    )]));
    let assistant = DocumentAssistant::new(provider.clone(), &AppConfig::default());

    let err = assistant.ask_with_context("notes", "q").await.unwrap_err();

    assert!(matches!(err, AskError::Unclassified(_)));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_question_never_reaches_the_provider() {
    let provider = Arc::new(ScriptedProvider::text("unused"));
    let assistant = DocumentAssistant::new(provider.clone(), &AppConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = assistant
        .ask_with_context_cancellable("notes", "q", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AskError::Cancelled));
    assert_eq!(provider.calls(), 0);
}

// ── Topics and study plans ───────────────────────────────────────────────

#[tokio::test]
async fn text_file_topics_drive_the_study_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "biology.txt",
        "Cell Structure\n\nCells are bounded by membranes.\n\n\
         1. Mitosis\nOne cell becomes two.\n\n- Meiosis\nGametes are produced.\n",
    );

    let assistant = DocumentAssistant::new(
        Arc::new(ScriptedProvider::text("unused")),
        &AppConfig::default(),
    );
    let document = load(&path).await;

    assert_eq!(
        assistant.extract_topics(&document),
        vec!["Cell Structure", "Mitosis", "Meiosis"]
    );

    let plan = pagewise_agent::OutlinePlanner::new(3).plan(&assistant.extract_topics(&document));
    assert_eq!(plan.sessions.len(), 4);
    assert_eq!(plan.days(), 2);
    assert_eq!(plan.sessions[3].title, "Final Review");
}

// ── Configuration ────────────────────────────────────────────────────────

#[test]
fn default_config_file_parses_to_defaults() {
    let config: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.default_provider, defaults.default_provider);
    assert_eq!(config.context.max_tokens, defaults.context.max_tokens);
    assert_eq!(config.retry.shrink_attempts, defaults.retry.shrink_attempts);
    assert!(config.validate().is_ok());
}
