use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::signature_engine::SignatureAlgorithm;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub signing: SigningConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub passphrase: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SigningConfig {
    pub key_alias: String,
    pub key_passphrase: String,
    pub document: PathBuf,
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_archive_path")]
    pub archive_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_path: default_archive_path(),
        }
    }
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("target/signed_documents.tar")
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;

        let config: AppConfig =
            toml::from_str(&config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration with default path (config.toml)
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            path = "input/client.store"
            passphrase = "rcpxrcpx"

            [signing]
            key_alias = "client"
            key_passphrase = "rcpx"
            document = "input/lorem_ipsum.txt"
            algorithm = "sha512-rsa"

            [output]
            archive_path = "out/signed.tar"
            "#,
        )
        .unwrap();

        assert_eq!(config.signing.key_alias, "client");
        assert_eq!(config.signing.algorithm, SignatureAlgorithm::Sha512Rsa);
        assert_eq!(config.output.archive_path, PathBuf::from("out/signed.tar"));
    }

    #[test]
    fn test_defaults_apply() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            path = "input/client.store"
            passphrase = "rcpxrcpx"

            [signing]
            key_alias = "client"
            key_passphrase = "rcpx"
            document = "input/lorem_ipsum.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.signing.algorithm, SignatureAlgorithm::Sha256Rsa);
        assert_eq!(
            config.output.archive_path,
            PathBuf::from("target/signed_documents.tar")
        );
    }
}
