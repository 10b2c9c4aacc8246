//! Signature engine
//!
//! Signs documents with one alias-selected private key and verifies
//! candidate signatures against every public key found in the certificate
//! store. Verification is any-of-N: it reports that at least one stored key
//! validates the signature, never which one.
//!
//! The engine is a two-state machine. It starts unkeyed; [`SignatureEngine::use_key`]
//! binds a private key and may be called again to rebind (last write wins).
//! Signing requires a bound key; verification works in either state.

use std::fmt;

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::sign::{Signer, Verifier};
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;

use crate::certificate_store::CertificateStore;
use crate::error::{EngineError, StoreError};

/// Signature size in bytes produced by an RSA-2048 key. The engine assumes
/// all keys in the store share this modulus size; the digest choice does not
/// change it.
pub const RSA_2048_SIGNATURE_SIZE: usize = 256;

/// The digest+cipher combination bound to an engine instance, applied
/// uniformly to signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA PKCS#1 v1.5
    #[default]
    Sha256Rsa,
    /// SHA-512 with RSA PKCS#1 v1.5
    Sha512Rsa,
}

impl SignatureAlgorithm {
    fn digest(self) -> MessageDigest {
        match self {
            SignatureAlgorithm::Sha256Rsa => MessageDigest::sha256(),
            SignatureAlgorithm::Sha512Rsa => MessageDigest::sha512(),
        }
    }

    /// Fixed signature size this algorithm produces with the assumed
    /// RSA-2048 keys.
    pub const fn signature_size(self) -> usize {
        RSA_2048_SIGNATURE_SIZE
    }
}

/// The currently bound signing key.
///
/// Key material is held as DER inside a [`SecretBox`] so it is zeroized on
/// drop and never appears in debug output; the working key object is rebuilt
/// for the duration of each signing operation only.
struct SelectedKey {
    alias: String,
    der: SecretBox<Vec<u8>>,
}

impl SelectedKey {
    fn bind(alias: &str, key: &PKey<Private>) -> Result<Self, EngineError> {
        let der = key.private_key_to_der()?;
        Ok(Self {
            alias: alias.to_string(),
            der: SecretBox::new(Box::new(der)),
        })
    }

    fn private_key(&self) -> Result<PKey<Private>, EngineError> {
        Ok(PKey::private_key_from_der(self.der.expose_secret())?)
    }
}

impl fmt::Debug for SelectedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedKey")
            .field("alias", &self.alias)
            .field("der", &"<redacted>")
            .finish()
    }
}

/// Document signing and multi-key signature verification over one loaded
/// [`CertificateStore`].
///
/// The public keys of every certificate are extracted once, at construction,
/// in store enumeration order; the engine never re-reads the store for
/// verification.
pub struct SignatureEngine<'a> {
    store: &'a CertificateStore,
    algorithm: SignatureAlgorithm,
    public_keys: Vec<PKey<Public>>,
    selected: Option<SelectedKey>,
    last_signature: Option<Vec<u8>>,
}

impl<'a> SignatureEngine<'a> {
    /// Build an engine over `store` with the default SHA-256/RSA algorithm.
    pub fn new(store: &'a CertificateStore) -> Result<Self, EngineError> {
        Self::with_algorithm(store, SignatureAlgorithm::default())
    }

    /// Build an engine over `store` with an explicit algorithm binding.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoUsablePublicKey`] if any certificate in the store
    /// yields no extractable public key.
    pub fn with_algorithm(
        store: &'a CertificateStore,
        algorithm: SignatureAlgorithm,
    ) -> Result<Self, EngineError> {
        let mut public_keys = Vec::with_capacity(store.len());
        for (alias, certificate) in store.certificates() {
            let key = certificate
                .public_key()
                .map_err(|_| StoreError::NoUsablePublicKey(alias.to_string()))?;
            public_keys.push(key);
        }

        Ok(Self {
            store,
            algorithm,
            public_keys,
            selected: None,
            last_signature: None,
        })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Bind the private key stored under `alias` as the signing key,
    /// replacing any previously bound key.
    ///
    /// # Errors
    ///
    /// * [`StoreError::UnknownAlias`] / [`StoreError::BadKeyPassphrase`] /
    ///   [`StoreError::UnsupportedKeyAlgorithm`] - propagated from the store
    /// * [`EngineError::NullKeyRejected`] - the store handed back a
    ///   degenerate zero-size key handle
    pub fn use_key(&mut self, alias: &str, key_passphrase: &str) -> Result<(), EngineError> {
        tracing::info!("Using key {}", alias);
        let key = self.store.private_key_for(alias, key_passphrase)?;
        if key.size() == 0 {
            return Err(EngineError::NullKeyRejected(alias.to_string()));
        }
        self.selected = Some(SelectedKey::bind(alias, &key)?);
        Ok(())
    }

    /// Alias of the currently bound signing key, if any.
    pub fn selected_alias(&self) -> Option<&str> {
        self.selected.as_ref().map(|key| key.alias.as_str())
    }

    /// Sign `document` with the bound key, returning the signature and
    /// keeping it as the engine's current signature.
    ///
    /// SHA-256/RSA PKCS#1 v1.5 is deterministic: the same document and key
    /// always produce the same bytes.
    ///
    /// # Errors
    ///
    /// * [`EngineError::NoKeySelected`] - no successful [`SignatureEngine::use_key`] yet
    /// * [`EngineError::EmptyDocument`] - `document` is empty; rejected
    ///   before the signing primitive is touched
    pub fn sign_document(&mut self, document: &[u8]) -> Result<Vec<u8>, EngineError> {
        let selected = self.selected.as_ref().ok_or(EngineError::NoKeySelected)?;
        if document.is_empty() {
            return Err(EngineError::EmptyDocument);
        }

        tracing::info!("Signing document with key {}", selected.alias);
        let key = selected.private_key()?;
        let mut signer = Signer::new(self.algorithm.digest(), &key)?;
        let signature = signer.sign_oneshot_to_vec(document)?;

        self.last_signature = Some(signature.clone());
        Ok(signature)
    }

    /// Check `candidate` against every public key in store enumeration
    /// order; `true` as soon as one key validates it, `false` if none does.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSignatureLength`] if `candidate` is not exactly
    /// the algorithm's fixed signature size. This shape check runs before any
    /// cryptographic work; a well-formed signature that merely fails to
    /// validate is `Ok(false)`, never an error.
    pub fn verify(&self, document: &[u8], candidate: &[u8]) -> Result<bool, EngineError> {
        tracing::info!("Asked to verify document signature");
        let expected = self.algorithm.signature_size();
        if candidate.len() != expected {
            return Err(EngineError::InvalidSignatureLength {
                expected,
                actual: candidate.len(),
            });
        }

        for key in &self.public_keys {
            if self.key_validates(key, document, candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // A probe failure means this key cannot have produced the candidate;
    // callers cannot distinguish that from a plain mismatch, so it is one.
    fn key_validates(&self, key: &PKey<Public>, document: &[u8], candidate: &[u8]) -> bool {
        let mut verifier = match Verifier::new(self.algorithm.digest(), key) {
            Ok(verifier) => verifier,
            Err(_) => return false,
        };
        verifier.verify_oneshot(candidate, document).unwrap_or(false)
    }

    /// The last signature produced by [`SignatureEngine::sign_document`],
    /// `None` until the first signing call.
    pub fn current_signature(&self) -> Option<&[u8]> {
        self.last_signature.as_deref()
    }
}

impl fmt::Debug for SignatureEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureEngine")
            .field("algorithm", &self.algorithm)
            .field("public_keys", &self.public_keys.len())
            .field("selected", &self.selected)
            .field(
                "last_signature_len",
                &self.last_signature.as_ref().map(Vec::len),
            )
            .finish()
    }
}
