//! `pagewise ask`: Ask questions about a document.
//!
//! With `--question`, answers once and exits. Otherwise reads questions from
//! stdin until `exit`, `quit`, end of input or Ctrl+C at the prompt. Ctrl+C
//! while a question is running cancels that question.

use pagewise_agent::DocumentAssistant;
use pagewise_core::AskError;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    file: &Path,
    question: Option<String>,
    max_tokens: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    if !config.has_api_key() {
        eprintln!("⚠️  No API key configured. Run `pagewise onboard` or set MISTRAL_API_KEY.");
    }

    let document = super::load_document(file, &config).await?;
    let provider = pagewise_providers::router::build_from_config(&config)
        .default()
        .ok_or("No default provider configured")?;
    let assistant = DocumentAssistant::new(provider, &config);
    let budget = super::budget(&config, max_tokens);

    tracing::info!(chars = document.char_len(), "Document loaded");

    if let Some(q) = question {
        let context = assistant.prepare_context(&document, &q, budget);
        let answer = answer(&assistant, &context, &q).await?;
        println!("{answer}");
        return Ok(());
    }

    println!("📄 Ask me anything about {}", file.display());
    println!("   Type 'exit' or 'quit' to leave. Ctrl+C cancels a question.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let q = line.trim();
        if q.is_empty() {
            continue;
        }
        if q == "exit" || q == "quit" {
            break;
        }

        let context = assistant.prepare_context(&document, q, budget);
        match answer(&assistant, &context, q).await {
            Ok(a) => println!("\n{a}\n"),
            Err(AskError::Cancelled) => println!("\n(cancelled)\n"),
            Err(e) => eprintln!("\n❌ {e}\n"),
        }
    }

    Ok(())
}

/// One question, cancellable with Ctrl+C.
async fn answer(
    assistant: &DocumentAssistant,
    context: &str,
    question: &str,
) -> Result<String, AskError> {
    let outcome = super::with_ctrl_c(|cancel| async move {
        assistant
            .ask_with_context_cancellable(context, question, &cancel)
            .await
    })
    .await?;

    if outcome.exhausted {
        tracing::warn!(attempts = outcome.attempts.len(), "Every attempt failed");
    }
    Ok(outcome.answer)
}
