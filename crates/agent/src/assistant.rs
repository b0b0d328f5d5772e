//! The document assistant: the three operations consumers need.
//!
//! - [`DocumentAssistant::prepare_context`]: fit a document to a budget for a query
//! - [`DocumentAssistant::ask_with_context`]: answer a query against a context
//! - [`DocumentAssistant::extract_topics`]: candidate study topics
//!
//! Everything is configured once from [`AppConfig`]; no call keeps state
//! between invocations.

use crate::context::{AssembledContext, ContextAssembler, ContextBudget};
use crate::retry::{AskOutcome, RetryController};
use crate::study_plan::{OutlinePlanner, StudyPlan, StudyPlanner};
use crate::topics::TopicExtractor;
use pagewise_config::AppConfig;
use pagewise_core::classify::FailureClassifier;
use pagewise_core::error::AskError;
use pagewise_core::{Document, Provider};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct DocumentAssistant {
    assembler: ContextAssembler,
    retry: RetryController,
    topics: TopicExtractor,
    planner: Box<dyn StudyPlanner>,
}

impl DocumentAssistant {
    /// The model is the default provider's `default_model` if set, else the
    /// top-level `default_model`. `PAGEWISE_MODEL` rewrites both when the
    /// environment overrides are applied.
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            assembler: ContextAssembler::new(config.context.clone()),
            retry: RetryController::new(
                provider,
                config.retry.clone(),
                model,
                config.default_temperature,
                config.default_max_tokens,
            ),
            topics: TopicExtractor::new(&config.topics),
            planner: Box::new(OutlinePlanner::default()),
        }
    }

    /// Replace the failure classifier used by the retry controller.
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.retry = self.retry.with_classifier(classifier);
        self
    }

    pub fn with_planner(mut self, planner: Box<dyn StudyPlanner>) -> Self {
        self.planner = planner;
        self
    }

    /// The budget configured by `[context] max_tokens`.
    pub fn default_budget(&self) -> ContextBudget {
        self.assembler.default_budget()
    }

    /// A context string for `query` no larger than `budget` (plus the
    /// truncation marker in the head/tail case).
    pub fn prepare_context(&self, document: &Document, query: &str, budget: ContextBudget) -> String {
        self.assemble_context(document, query, budget).text
    }

    /// Like [`Self::prepare_context`], keeping the assembly details.
    pub fn assemble_context(
        &self,
        document: &Document,
        query: &str,
        budget: ContextBudget,
    ) -> AssembledContext {
        self.assembler.assemble(document, query, budget)
    }

    /// Answer `query` from `context`. Size and transport failures end in a
    /// fixed apology; only unclassified failures are returned as errors.
    pub async fn ask_with_context(&self, context: &str, query: &str) -> Result<String, AskError> {
        self.ask_with_context_cancellable(context, query, &CancellationToken::new())
            .await
            .map(|outcome| outcome.answer)
    }

    pub async fn ask_with_context_cancellable(
        &self,
        context: &str,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<AskOutcome, AskError> {
        let outcome = self.retry.run(context, query, cancel).await?;
        info!(
            attempts = outcome.attempts.len(),
            exhausted = outcome.exhausted,
            "Question answered"
        );
        Ok(outcome)
    }

    /// Prepare the context with the default budget, then answer.
    pub async fn ask(&self, document: &Document, query: &str) -> Result<String, AskError> {
        let context = self.prepare_context(document, query, self.default_budget());
        self.ask_with_context(&context, query).await
    }

    pub fn extract_topics(&self, document: &Document) -> Vec<String> {
        self.topics.extract(document.text())
    }

    pub fn study_plan(&self, document: &Document) -> StudyPlan {
        self.planner.plan(&self.extract_topics(document))
    }
}
