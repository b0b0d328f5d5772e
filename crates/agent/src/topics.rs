//! Topic extraction for study planning.
//!
//! A [`TopicDetector`] decides whether one line is a topic candidate; the
//! [`TopicExtractor`] runs it over every line, keeps the first occurrence of
//! each candidate and stops at the configured maximum.

use pagewise_config::TopicConfig;
use regex_lite::Regex;
use tracing::debug;

/// Per-line topic detection strategy.
pub trait TopicDetector: Send + Sync {
    /// The topic named by `line`, if any. `next` is the following line.
    fn detect(&self, line: &str, next: Option<&str>) -> Option<String>;
}

/// Uppercase start, then letters, digits, spaces and hyphens only.
const HEADING_PATTERN: &str = r"^[A-Z][A-Za-z0-9 \-]*$";

/// A leading number (`1.`, `2)`, `3.1`) or bullet followed by whitespace.
const LIST_MARKER_PATTERN: &str = r"^(?:\d+(?:\.\d+)*[.)]?|[-*+•])\s+(.+)$";

/// Pattern-based heading detection:
///
/// - a short line that looks like a title (`Cell Division`)
/// - a numbered or bulleted line whose body looks like a title (`2. Mitosis`)
/// - a short line followed by a blank line that starts with a letter and
///   does not end in a period
pub struct HeuristicTopicDetector {
    max_line_chars: usize,
    heading: Option<Regex>,
    list_item: Option<Regex>,
}

impl Default for HeuristicTopicDetector {
    fn default() -> Self {
        Self::new(&TopicConfig::default())
    }
}

impl HeuristicTopicDetector {
    pub fn new(config: &TopicConfig) -> Self {
        Self {
            max_line_chars: config.max_line_chars,
            heading: Regex::new(HEADING_PATTERN).ok(),
            list_item: Regex::new(LIST_MARKER_PATTERN).ok(),
        }
    }

    fn looks_like_heading(&self, s: &str) -> bool {
        self.heading.as_ref().is_some_and(|re| re.is_match(s))
    }
}

impl TopicDetector for HeuristicTopicDetector {
    fn detect(&self, line: &str, next: Option<&str>) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || line.chars().count() > self.max_line_chars {
            return None;
        }

        if self.looks_like_heading(line) {
            return Some(line.to_string());
        }

        if let Some(body) = self
            .list_item
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            && self.looks_like_heading(body)
        {
            return Some(body.to_string());
        }

        let followed_by_blank = next.is_some_and(|n| n.trim().is_empty());
        if followed_by_blank
            && line.chars().next().is_some_and(char::is_alphabetic)
            && !line.ends_with('.')
        {
            return Some(line.to_string());
        }

        None
    }
}

/// Collects distinct topics in first-seen order.
pub struct TopicExtractor {
    detector: Box<dyn TopicDetector>,
    max_topics: usize,
}

impl Default for TopicExtractor {
    fn default() -> Self {
        Self::new(&TopicConfig::default())
    }
}

impl TopicExtractor {
    pub fn new(config: &TopicConfig) -> Self {
        Self {
            detector: Box::new(HeuristicTopicDetector::new(config)),
            max_topics: config.max_topics,
        }
    }

    /// Use a different detection strategy.
    pub fn with_detector(detector: Box<dyn TopicDetector>, max_topics: usize) -> Self {
        Self {
            detector,
            max_topics,
        }
    }

    pub fn extract(&self, text: &str) -> Vec<String> {
        let lines: Vec<&str> = text.lines().collect();
        let mut topics: Vec<String> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if topics.len() >= self.max_topics {
                break;
            }
            if let Some(topic) = self.detector.detect(line, lines.get(i + 1).copied())
                && !topics.contains(&topic)
            {
                topics.push(topic);
            }
        }

        debug!(count = topics.len(), "Topics extracted");
        topics
    }
}
