//! Budget assembly: fit a document into a character budget for one query.
//!
//! Three tiers, chosen in order:
//!
//! 1. **Passthrough**: small documents are returned unchanged.
//! 2. **Relevance**: an introduction block (the first 5% of sections, at
//!    least five) followed by the top-scoring sections and their immediate
//!    neighbours, each block in document order.
//! 3. **Head/tail**: when no section outside the introduction block (or next
//!    to a scoring one) could be added, for example a document without
//!    blank-line paragraphs, the first 70% of the budget from the start of the document and the last 30% from the end,
//!    joined by [`TRUNCATION_MARKER`].
//!
//! Assembly is deterministic: identical inputs always produce identical
//! outputs.

use crate::context::score::{self, RelevanceScorer};
use crate::context::segment::{self, Section};
use crate::context::token::{ContextBudget, char_prefix, char_suffix, estimate_tokens};
use pagewise_config::ContextConfig;
use pagewise_core::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Inserted exactly once between head and tail in the head/tail tier.
pub const TRUNCATION_MARKER: &str = "[...Document truncated due to size limitations...]";

const SECTION_SEPARATOR: &str = "\n\n";
const SEPARATOR_CHARS: usize = 2;
const HEAD_SHARE: f64 = 0.7;
const TAIL_SHARE: f64 = 0.3;

/// Which assembly tier produced a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyTier {
    Passthrough,
    Relevance,
    HeadTail,
}

impl std::fmt::Display for AssemblyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Passthrough => "passthrough",
            Self::Relevance => "relevance",
            Self::HeadTail => "head/tail",
        })
    }
}

/// A bounded context string plus how it was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub text: String,
    pub tier: AssemblyTier,
    /// Section indices included, in output order. Empty outside the
    /// relevance tier.
    pub section_indices: Vec<usize>,
    pub total_sections: usize,
}

impl AssembledContext {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

/// The context assembler. Stateless; create one and reuse it.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: ContextConfig,
    scorer: RelevanceScorer,
}

impl ContextAssembler {
    pub fn new(config: ContextConfig) -> Self {
        let scorer = RelevanceScorer::new(&config);
        Self { config, scorer }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The budget configured by `[context] max_tokens`.
    pub fn default_budget(&self) -> ContextBudget {
        ContextBudget::from_tokens(self.config.max_tokens)
    }

    /// Assemble the context for `query` within `budget`.
    pub fn assemble(&self, document: &Document, query: &str, budget: ContextBudget) -> AssembledContext {
        let len = document.char_len();

        if len < self.config.small_document_chars && len <= budget.max_chars {
            debug!(chars = len, "Using entire document");
            return AssembledContext {
                text: document.text().to_string(),
                tier: AssemblyTier::Passthrough,
                section_indices: Vec::new(),
                total_sections: 0,
            };
        }

        let mut sections = segment::segment(document.text());
        self.scorer.score(&mut sections, query);

        let context = if self.extends_intro(&sections) {
            self.assemble_relevant(&sections, budget)
        } else {
            Self::head_tail(document, sections.len(), budget)
        };

        debug!(
            tier = %context.tier,
            sections = context.section_indices.len(),
            total_sections = context.total_sections,
            chars = context.char_len(),
            tokens = context.estimated_tokens(),
            budget_tokens = budget.max_tokens,
            "Context assembled"
        );
        context
    }

    /// Number of leading sections that form the introduction block.
    pub fn intro_count(&self, total: usize) -> usize {
        let fraction = (total as f32 * self.config.intro_fraction).ceil() as usize;
        fraction.max(self.config.intro_min_sections).min(total)
    }

    /// How many scored sections may enter the relevant set.
    pub fn top_n(&self, total: usize) -> usize {
        if total > self.config.large_corpus_sections {
            self.config.relevant_top_n_large
        } else {
            self.config.relevant_top_n
        }
    }

    /// Whether some scoring candidate or a neighbour of one lies past the
    /// intro. Otherwise the relevance tier could only repeat the intro.
    fn extends_intro(&self, sections: &[Section]) -> bool {
        let total = sections.len();
        let intro_count = self.intro_count(total);
        score::rank(sections)
            .into_iter()
            .filter(|&i| sections[i].score > 0)
            .take(self.top_n(total))
            .any(|i| (i + 1).min(total - 1) >= intro_count)
    }

    fn assemble_relevant(&self, sections: &[Section], budget: ContextBudget) -> AssembledContext {
        let total = sections.len();
        let cap = budget.max_chars;
        let intro_count = self.intro_count(total);

        let mut intro = join(&sections[..intro_count]);
        if intro.chars().count() > cap {
            intro = char_prefix(&intro, cap).to_string();
        }
        let mut used = intro.chars().count();
        let mut included: BTreeSet<usize> = (0..intro_count).collect();
        let mut relevant: BTreeSet<usize> = BTreeSet::new();

        let candidates = score::rank(sections)
            .into_iter()
            .filter(|&i| sections[i].score > 0)
            .take(self.top_n(total));

        for i in candidates {
            let group: Vec<usize> = [i.checked_sub(1), Some(i), Some(i + 1)]
                .into_iter()
                .flatten()
                .filter(|&j| j < total && !included.contains(&j))
                .collect();
            if group.is_empty() {
                continue;
            }

            let cost: usize = group
                .iter()
                .map(|&j| sections[j].char_len() + SEPARATOR_CHARS)
                .sum();
            if used + cost > cap {
                break;
            }

            used += cost;
            included.extend(group.iter().copied());
            relevant.extend(group);
        }

        let relevant_sections: Vec<&Section> = relevant.iter().map(|&i| &sections[i]).collect();
        let mut text = intro;
        for section in relevant_sections {
            if !text.is_empty() {
                text.push_str(SECTION_SEPARATOR);
            }
            text.push_str(&section.text);
        }

        let mut section_indices: Vec<usize> = (0..intro_count).collect();
        section_indices.extend(relevant.iter().copied());

        AssembledContext {
            text,
            tier: AssemblyTier::Relevance,
            section_indices,
            total_sections: total,
        }
    }

    fn head_tail(document: &Document, total_sections: usize, budget: ContextBudget) -> AssembledContext {
        let text = document.text();

        // Nothing to cut.
        if document.char_len() <= budget.max_chars {
            return AssembledContext {
                text: text.to_string(),
                tier: AssemblyTier::Passthrough,
                section_indices: Vec::new(),
                total_sections,
            };
        }

        let head_chars = (budget.max_chars as f64 * HEAD_SHARE).floor() as usize;
        let tail_chars = (budget.max_chars as f64 * TAIL_SHARE).floor() as usize;
        let head = strip_marker(char_prefix(text, head_chars));
        let tail = strip_marker(char_suffix(text, tail_chars));

        AssembledContext {
            text: format!("{head}{SECTION_SEPARATOR}{TRUNCATION_MARKER}{SECTION_SEPARATOR}{tail}"),
            tier: AssemblyTier::HeadTail,
            section_indices: Vec::new(),
            total_sections,
        }
    }
}

fn join(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

fn strip_marker(s: &str) -> String {
    let mut out = s.to_string();
    while out.contains(TRUNCATION_MARKER) {
        out = out.replace(TRUNCATION_MARKER, "");
    }
    out
}
