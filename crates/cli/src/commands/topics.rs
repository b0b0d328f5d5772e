//! `pagewise topics`: List detected topics.

use pagewise_agent::TopicExtractor;
use std::path::Path;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let document = super::load_document(file, &config).await?;

    let topics = TopicExtractor::new(&config.topics).extract(document.text());
    if topics.is_empty() {
        println!("No topics detected.");
        return Ok(());
    }

    for (i, topic) in topics.iter().enumerate() {
        println!("{:>3}. {topic}", i + 1);
    }

    Ok(())
}
