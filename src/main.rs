//! Operator CLI for the translation cache.
//!
//! Usage:
//!   translation-cache migrate                  # Create tables and indexes
//!   translation-cache seed                     # Insert built-in languages (en, es)
//!   translation-cache languages                # List registered languages
//!   translation-cache default <lang>           # Make <lang> the default language
//!   translation-cache translate <lang> <text>  # Look up or create a translation
//!   translation-cache pending                  # List translations awaiting approval
//!   translation-cache approve <id> <approver>  # Approve a translation
//!   translation-cache delete <id>              # Delete a translation
//!
//! Required environment variables:
//! - DATABASE_URL
//!
//! Optional:
//! - TRANSLATION_PROVIDER (echo or openai, defaults to echo)
//! - OPENAI_API_KEY, OPENAI_MODEL, OPENAI_API_URL
//! - MAX_TEXT_LENGTH, MAX_BATCH_SIZE, DELETE_PROTECTION_THRESHOLD

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;
use translation_cache::{
    catalog::LanguageCatalog, config::Config, store::PgStore, translation::Approval,
    translator::Translator,
};

fn print_usage() {
    eprintln!("Usage: translation-cache <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  migrate                  Create tables and indexes");
    eprintln!("  seed                     Insert built-in languages");
    eprintln!("  languages                List registered languages");
    eprintln!("  default <lang>           Make <lang> the default language");
    eprintln!("  translate <lang> <text>  Look up or create a translation");
    eprintln!("  pending                  List translations awaiting approval");
    eprintln!("  approve <id> <approver>  Approve a translation");
    eprintln!("  delete <id>              Delete a translation");
}

fn parse_id(value: Option<&String>) -> Result<i64> {
    let value = value.context("Missing translation id")?;
    value
        .parse()
        .with_context(|| format!("Invalid translation id '{}'", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_cache=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        bail!("No command given");
    };

    let config = Config::from_env()?;
    let store = PgStore::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    store.migrate().await?;

    let store = Arc::new(store);
    let catalog = LanguageCatalog::new(store.clone());
    let translator = Translator::new(store, config.build_provider()?, config.limits());

    match command.as_str() {
        "migrate" => {
            info!("✓ Migrations applied");
        }
        "seed" => {
            let added = catalog.seed_defaults().await?;
            info!("✓ Seeded {} languages", added);
        }
        "languages" => {
            for language in catalog.list_languages(false).await? {
                println!(
                    "{}  {:<12} {:<12} {}{}",
                    language.code,
                    language.name,
                    language.native_name,
                    if language.is_active { "active" } else { "inactive" },
                    if language.is_default { " (default)" } else { "" }
                );
            }
        }
        "default" => {
            let code = args.get(2).context("Missing language code")?;
            catalog.set_default_language(code).await?;
            info!("✓ Default language set to '{}'", code);
        }
        "translate" => {
            let code = args.get(2).context("Missing language code")?;
            if args.len() < 4 {
                bail!("Missing text to translate");
            }
            let text = args[3..].join(" ");

            let result = translator.translate(&text, code, None, None).await?;
            println!("{}", result.translated_text);
            info!(
                "Served from {}",
                if result.from_cache { "cache" } else { "provider" }
            );
            info!("Metrics: {:?}", translator.metrics().report());
        }
        "pending" => {
            let pending = translator.pending_approvals().await?;
            for entry in &pending {
                println!(
                    "#{} [{}] {} => {} (used {} times)",
                    entry.id,
                    entry.language_code,
                    entry.original_text,
                    entry.destination_text,
                    entry.usage_count
                );
            }
            info!("{} translations awaiting approval", pending.len());
        }
        "approve" => {
            let id = parse_id(args.get(2))?;
            let approver = args.get(3).context("Missing approver")?;
            let approved = translator.approve(id, approver).await?;
            if let Approval::Approved { approved_at, .. } = approved.approval {
                info!("✓ Translation {} approved at {}", id, approved_at.to_rfc3339());
            }
        }
        "delete" => {
            let id = parse_id(args.get(2))?;
            translator.delete_translation(id).await?;
            info!("✓ Translation {} deleted", id);
        }
        other => {
            print_usage();
            bail!("Unknown command: {}", other);
        }
    }

    // Let cache-hit usage updates land before the runtime shuts down
    translator.flush().await;

    Ok(())
}
