//! Query-driven context selection.
//!
//! Document text flows through three stages:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Segment | [`segment`] | Paragraph sections with stable indices |
//! | Score | [`score`] | Per-section relevance against the query |
//! | Assemble | [`assembler`] | A context string within the character budget |

pub mod assembler;
pub mod score;
pub mod segment;
pub mod token;

pub use assembler::{AssembledContext, AssemblyTier, ContextAssembler, TRUNCATION_MARKER};
pub use score::{RelevanceScorer, significant_terms};
pub use segment::{Section, segment};
pub use token::{CHARS_PER_TOKEN, ContextBudget, estimate_tokens};
