//! Question answering over large documents.
//!
//! A question about a document goes through four steps:
//!
//! 1. **Segment** the document text into paragraph sections
//! 2. **Score** each section against the question
//! 3. **Assemble** an introduction plus the best sections within the budget
//!    (or the whole document when it is small, or head and tail when nothing
//!    matches)
//! 4. **Ask** the completion provider, retrying with less content when the
//!    request is too large or the transport fails
//!
//! Topic extraction and study planning run on the same document text.

pub mod assistant;
pub mod context;
pub mod prompt;
pub mod retry;
pub mod study_plan;
pub mod topics;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assistant::DocumentAssistant;
pub use context::{
    AssembledContext, AssemblyTier, ContextAssembler, ContextBudget, RelevanceScorer, Section,
    TRUNCATION_MARKER,
};
pub use retry::{APOLOGY, AskOutcome, Attempt, AttemptKind, AttemptState, EMPTY_RESPONSE, RetryController};
pub use study_plan::{OutlinePlanner, StudyPlan, StudyPlanner, StudySession};
pub use topics::{HeuristicTopicDetector, TopicDetector, TopicExtractor};
