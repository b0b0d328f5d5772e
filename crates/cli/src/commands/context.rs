//! `pagewise context`: Print the context assembled for a question.

use pagewise_agent::DocumentAssistant;
use std::path::Path;

pub async fn run(
    file: &Path,
    query: &str,
    max_tokens: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let document = super::load_document(file, &config).await?;

    let provider = pagewise_providers::router::build_from_config(&config)
        .default()
        .ok_or("No default provider configured")?;
    let assistant = DocumentAssistant::new(provider, &config);

    let budget = super::budget(&config, max_tokens);
    let assembled = assistant.assemble_context(&document, query, budget);

    eprintln!(
        "  tier: {:?}, ~{} of {} tokens, {} of {} chars, {} of {} sections",
        assembled.tier,
        assembled.estimated_tokens(),
        budget.max_tokens,
        assembled.char_len(),
        document.char_len(),
        assembled.section_indices.len(),
        assembled.total_sections,
    );
    println!("{}", assembled.text);

    Ok(())
}
