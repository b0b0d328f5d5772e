//! `pagewise config`: Configuration management commands.

use pagewise_config::AppConfig;

const REDACTED: &str = "***";

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.has_api_key() {
                warnings.push("No API key set (set PAGEWISE_API_KEY or MISTRAL_API_KEY env var)");
            }
            if config.context.small_document_chars > config.context.max_tokens * 4 {
                warnings.push(
                    "context.small_document_chars exceeds the context budget; the budget wins",
                );
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!("   Budget:    {} tokens", config.context.max_tokens);
            println!(
                "   Retries:   {} shrinking + 1 minimal",
                config.retry.shrink_attempts
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    config
}
