//! `pagewise stats`: Document statistics.

use pagewise_core::document::format_file_size;
use pagewise_core::{DocumentStats, FileType};
use std::path::Path;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let document = super::load_document(file, &config).await?;

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(file)?.len();
    let stats = DocumentStats::estimate(document.text());

    println!("📄 {name}");
    println!("   Type:       {}", FileType::from_file_name(&name));
    println!("   Size:       {}", format_file_size(size));
    println!("   Characters: {}", document.char_len());
    println!("   Words:      {}", stats.word_count);
    println!("   Pages:      ~{}", stats.page_count);

    Ok(())
}
