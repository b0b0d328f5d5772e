//! `pagewise plan`: Build a study plan from the detected topics.

use pagewise_agent::{OutlinePlanner, StudyPlanner, TopicExtractor};
use std::path::Path;

pub async fn run(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let document = super::load_document(file, &config).await?;

    let topics = TopicExtractor::new(&config.topics).extract(document.text());
    let plan = OutlinePlanner::default().plan(&topics);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("📚 Study plan ({} days)\n", plan.days());
    let mut current_day = 0;
    for session in &plan.sessions {
        if session.day != current_day {
            current_day = session.day;
            println!("Day {current_day}");
        }
        println!("  • {} ({})", session.title, session.estimated_time);
        println!("    {}", session.description);
    }

    Ok(())
}
