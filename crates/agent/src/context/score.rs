//! Query-driven relevance scoring.
//!
//! Each whole-word occurrence of a significant query term adds
//! [`TERM_WEIGHT`]; a short section starting with an uppercase letter gets
//! [`HEADING_BONUS`]. Large documents are scored on a uniform-stride sample.

use crate::context::segment::Section;
use pagewise_config::ContextConfig;

pub const TERM_WEIGHT: u32 = 2;
pub const HEADING_BONUS: u32 = 5;

/// Minimum significant term length is one more than this.
const MIN_TERM_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "been", "before", "being", "below", "between",
    "both", "could", "describe", "does", "doing", "down", "during", "each", "explain", "from",
    "further", "give", "have", "having", "here", "into", "just", "like", "more", "most", "much",
    "once", "only", "other", "over", "please", "same", "should", "show", "some", "such", "tell",
    "than", "that", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "until", "very", "were", "what", "when", "where", "which", "while", "whom", "whose",
    "with", "would", "your",
];

/// Significant terms of a query: case-folded words longer than three
/// characters that are not stop words, deduplicated in first-seen order.
pub fn significant_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in words(query) {
        let word = word.to_lowercase();
        if word.chars().count() > MIN_TERM_CHARS
            && !STOP_WORDS.contains(&word.as_str())
            && !terms.contains(&word)
        {
            terms.push(word);
        }
    }
    terms
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Scores sections against a query.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    heading_max_chars: usize,
    sample_cap: usize,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

impl RelevanceScorer {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            heading_max_chars: config.heading_max_chars,
            sample_cap: config.score_sample_cap.max(1),
        }
    }

    /// Score one section against precomputed significant terms.
    pub fn score_text(&self, text: &str, terms: &[String]) -> u32 {
        let mut score = 0;

        if !terms.is_empty() {
            for word in words(text) {
                let word = word.to_lowercase();
                if terms.iter().any(|t| *t == word) {
                    score += TERM_WEIGHT;
                }
            }
        }

        let trimmed = text.trim();
        if trimmed.chars().count() < self.heading_max_chars
            && trimmed.chars().next().is_some_and(char::is_uppercase)
        {
            score += HEADING_BONUS;
        }

        score
    }

    /// Indices of the sections that get scored. All of them up to the
    /// sample cap, otherwise a uniform stride across the list.
    pub fn sample_indices(&self, len: usize) -> Vec<usize> {
        if len <= self.sample_cap {
            return (0..len).collect();
        }
        (0..self.sample_cap).map(|i| i * len / self.sample_cap).collect()
    }

    /// Assign scores in place. Unsampled sections score zero.
    pub fn score(&self, sections: &mut [Section], query: &str) {
        let terms = significant_terms(query);
        for section in sections.iter_mut() {
            section.score = 0;
        }
        for i in self.sample_indices(sections.len()) {
            let score = self.score_text(&sections[i].text, &terms);
            sections[i].score = score;
        }
    }
}

/// Positions of `sections` ordered by score descending, ties by index.
pub fn rank(sections: &[Section]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sections.len()).collect();
    order.sort_by(|&a, &b| {
        sections[b]
            .score
            .cmp(&sections[a].score)
            .then(sections[a].index.cmp(&sections[b].index))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::segment::segment;

    #[test]
    fn terms_drop_short_and_stop_words() {
        assert_eq!(significant_terms("Explain photosynthesis"), vec!["photosynthesis"]);
        assert_eq!(
            significant_terms("What is the role of Chlorophyll in the CELL wall?"),
            vec!["role", "chlorophyll", "cell", "wall"]
        );
        assert!(significant_terms("what is it").is_empty());
    }

    #[test]
    fn terms_are_deduplicated() {
        assert_eq!(significant_terms("light LIGHT Light energy"), vec!["light", "energy"]);
    }

    #[test]
    fn whole_word_occurrences_count_twice() {
        let scorer = RelevanceScorer::default();
        let terms = significant_terms("photosynthesis");
        let text = "plants use photosynthesis. photosynthesis needs light, unlike photosynthesised";
        assert_eq!(scorer.score_text(text, &terms), 4);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let scorer = RelevanceScorer::default();
        let terms = significant_terms("PHOTOSYNTHESIS");
        assert_eq!(scorer.score_text("about photosynthesis and more text here", &terms), 2);
    }

    #[test]
    fn short_capitalized_section_gets_heading_bonus() {
        let scorer = RelevanceScorer::default();
        assert_eq!(scorer.score_text("Chapter 3: Cells", &[]), HEADING_BONUS);
        assert_eq!(scorer.score_text("chapter 3: cells", &[]), 0);
        let long = format!("Long paragraph {}", "word ".repeat(40));
        assert_eq!(scorer.score_text(&long, &[]), 0);
    }

    #[test]
    fn sampling_uses_uniform_stride() {
        let scorer = RelevanceScorer::new(&ContextConfig {
            score_sample_cap: 4,
            ..ContextConfig::default()
        });
        assert_eq!(scorer.sample_indices(3), vec![0, 1, 2]);
        assert_eq!(scorer.sample_indices(10), vec![0, 2, 5, 7]);
    }

    #[test]
    fn unsampled_sections_score_zero() {
        let scorer = RelevanceScorer::new(&ContextConfig {
            score_sample_cap: 2,
            ..ContextConfig::default()
        });
        let mut sections = segment("light a\n\nlight b\n\nlight c\n\nlight d");
        scorer.score(&mut sections, "light");
        let scores: Vec<u32> = sections.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![2, 0, 2, 0]);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = RelevanceScorer::default();
        let text = "osmosis and diffusion. osmosis again.";
        let terms = significant_terms("osmosis diffusion");
        let first = scorer.score_text(text, &terms);
        for _ in 0..5 {
            assert_eq!(scorer.score_text(text, &terms), first);
        }
    }

    #[test]
    fn rank_is_stable_for_equal_scores() {
        let mut sections = segment("x one\n\nx two\n\nx three\n\nx four");
        sections[1].score = 4;
        sections[2].score = 2;
        sections[3].score = 4;
        assert_eq!(rank(&sections), vec![1, 3, 2, 0]);
    }
}
