//! Study plans built from extracted topics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    pub completed: bool,
    pub day: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub sessions: Vec<StudySession>,
}

impl StudyPlan {
    pub fn days(&self) -> u32 {
        self.sessions.iter().map(|s| s.day).max().unwrap_or(0)
    }
}

/// Turns topics into a study plan.
pub trait StudyPlanner: Send + Sync {
    fn plan(&self, topics: &[String]) -> StudyPlan;
}

const SESSION_TIME: &str = "30 mins";
const FALLBACK_TOPIC: &str = "Document Content";
const REVIEW_TITLE: &str = "Final Review";
const REVIEW_DESCRIPTION: &str = "Synthesize all concepts and prepare summary notes.";

/// One 30-minute session per topic, a fixed number per day, then a final
/// review on the following day.
#[derive(Debug, Clone)]
pub struct OutlinePlanner {
    sessions_per_day: u32,
}

impl Default for OutlinePlanner {
    fn default() -> Self {
        Self {
            sessions_per_day: 2,
        }
    }
}

impl OutlinePlanner {
    pub fn new(sessions_per_day: u32) -> Self {
        Self {
            sessions_per_day: sessions_per_day.max(1),
        }
    }

    fn session(id: usize, title: &str, description: String, day: u32) -> StudySession {
        StudySession {
            id: id.to_string(),
            title: title.to_string(),
            description,
            estimated_time: SESSION_TIME.to_string(),
            completed: false,
            day,
        }
    }
}

impl StudyPlanner for OutlinePlanner {
    fn plan(&self, topics: &[String]) -> StudyPlan {
        let fallback = [FALLBACK_TOPIC.to_string()];
        let topics = if topics.is_empty() { &fallback[..] } else { topics };

        let mut sessions: Vec<StudySession> = topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let day = i as u32 / self.sessions_per_day + 1;
                let description = format!("Study the concepts related to {}.", topic.to_lowercase());
                Self::session(i + 1, topic, description, day)
            })
            .collect();

        let last_day = sessions.last().map_or(0, |s| s.day);
        sessions.push(Self::session(
            sessions.len() + 1,
            REVIEW_TITLE,
            REVIEW_DESCRIPTION.to_string(),
            last_day + 1,
        ));

        StudyPlan { sessions }
    }
}
