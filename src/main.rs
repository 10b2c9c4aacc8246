//! DocSign - Keystore-Backed Document Signing
//!
//! Driver binary: opens the configured certificate store, selects a signing
//! key, signs the configured document, verifies the produced signature (and
//! a falsified document as the negative case), then packages document and
//! signature into a tar archive.

use std::fs;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use docsign::config::AppConfig;
use docsign::signature_archive::SignatureArchive;
use docsign::{CertificateStore, SignatureEngine};

fn main() -> Result<()> {
    // RUST_LOG=docsign=debug for verbose output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsign=info")),
        )
        .with_target(false)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = AppConfig::from_file(&config_path)?;

    let store = CertificateStore::open(&config.store.path, &config.store.passphrase)
        .context("Failed to open certificate store")?;
    println!("✓ Certificate store loaded ({} entries)", store.len());

    let mut engine = SignatureEngine::with_algorithm(&store, config.signing.algorithm)
        .context("Failed to initialize signature engine")?;
    engine
        .use_key(&config.signing.key_alias, &config.signing.key_passphrase)
        .context("Failed to select signing key")?;
    println!("✓ Signing key '{}' selected", config.signing.key_alias);

    let document = fs::read(&config.signing.document).with_context(|| {
        format!(
            "Failed to read document {}",
            config.signing.document.display()
        )
    })?;
    let signature = engine
        .sign_document(&document)
        .context("Failed to sign document")?;
    println!("✓ Document signed ({} byte signature)", signature.len());

    // Verify our own signature, then a falsified document as the negative case
    let valid = engine.verify(&document, &signature)?;
    println!("Document signature is valid: {}", valid);
    let falsified = engine.verify(b"Falsified document", &signature)?;
    println!("Falsified document signature is valid: {}", falsified);
    if !valid || falsified {
        return Err(anyhow::anyhow!("Signature verification self-check failed"));
    }

    if let Some(parent) = config.output.archive_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut archive = SignatureArchive::create(&config.output.archive_path)?;
    archive.append_file(&config.signing.document)?;
    let signature_name = format!(
        "{}.sig",
        config
            .signing
            .document
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
    );
    archive.append_signature(&signature_name, &signature)?;
    archive.finish()?;
    println!(
        "✓ Document and signature archived at {}",
        config.output.archive_path.display()
    );

    Ok(())
}
