//! Certificate store
//!
//! Read-only view over a sealed credential container: an ordered set of
//! aliased certificate/private-key entries. All entries are enumerated
//! eagerly at open time; enumeration order is the container's native entry
//! order and is stable across repeated opens of the same file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use openssl::pkey::{Id, PKey, Private};
use openssl::x509::X509;

use crate::container;
use crate::error::StoreError;

#[derive(Debug)]
struct StoreEntry {
    certificate: X509,
    // PKCS#8 PEM, still encrypted under the per-key passphrase
    key_pem: Vec<u8>,
}

/// A loaded, immutable certificate store.
///
/// Holds one certificate and one passphrase-protected private key per alias.
/// Private keys stay encrypted until [`CertificateStore::private_key_for`]
/// is called with the matching per-key passphrase.
#[derive(Debug)]
pub struct CertificateStore {
    aliases: Vec<String>,
    entries: HashMap<String, StoreEntry>,
}

impl CertificateStore {
    /// Open the store at `path`, decrypting the container with `passphrase`.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] - no container file at `path`
    /// * [`StoreError::BadPassphrase`] - the container failed to authenticate
    /// * [`StoreError::Malformed`] - structural corruption (framing, tar
    ///   members, certificate PEM)
    pub fn open<P: AsRef<Path>>(path: P, passphrase: &str) -> Result<Self, StoreError> {
        let path = path.as_ref();
        tracing::info!("Opening certificate store {}", path.display());

        let sealed = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Io(e),
        })?;

        let mut aliases = Vec::new();
        let mut entries = HashMap::new();
        for entry in container::unseal(&sealed, passphrase)? {
            let certificate = X509::from_pem(&entry.certificate_pem).map_err(|e| {
                StoreError::Malformed(format!(
                    "unparseable certificate for alias '{}': {}",
                    entry.alias, e
                ))
            })?;
            aliases.push(entry.alias.clone());
            entries.insert(
                entry.alias,
                StoreEntry {
                    certificate,
                    key_pem: entry.key_pem,
                },
            );
        }

        tracing::debug!("Certificate store holds {} entries", aliases.len());
        Ok(Self { aliases, entries })
    }

    /// Aliases in store enumeration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The certificate stored under `alias`.
    pub fn certificate_for(&self, alias: &str) -> Result<&X509, StoreError> {
        self.entries
            .get(alias)
            .map(|entry| &entry.certificate)
            .ok_or_else(|| StoreError::UnknownAlias(alias.to_string()))
    }

    /// All `(alias, certificate)` pairs in store enumeration order.
    pub fn certificates(&self) -> impl Iterator<Item = (&str, &X509)> + '_ {
        self.aliases
            .iter()
            .map(|alias| (alias.as_str(), &self.entries[alias].certificate))
    }

    /// Decrypt and return the private key stored under `alias`.
    ///
    /// # Errors
    ///
    /// * [`StoreError::UnknownAlias`] - no entry under `alias`
    /// * [`StoreError::BadKeyPassphrase`] - `key_passphrase` failed to
    ///   decrypt the key material
    /// * [`StoreError::UnsupportedKeyAlgorithm`] - the key is not RSA and
    ///   cannot drive the configured signature algorithm
    pub fn private_key_for(
        &self,
        alias: &str,
        key_passphrase: &str,
    ) -> Result<PKey<Private>, StoreError> {
        let entry = self
            .entries
            .get(alias)
            .ok_or_else(|| StoreError::UnknownAlias(alias.to_string()))?;

        let key =
            PKey::private_key_from_pem_passphrase(&entry.key_pem, key_passphrase.as_bytes())
                .map_err(|_| StoreError::BadKeyPassphrase(alias.to_string()))?;

        if key.id() != Id::RSA {
            return Err(StoreError::UnsupportedKeyAlgorithm(alias.to_string()));
        }
        Ok(key)
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
