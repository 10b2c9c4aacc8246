//! DocSign - Keystore-Backed Document Signing
//!
//! A document-signing and signature-verification library backed by a
//! passphrase-protected certificate store. A store holds zero or more
//! aliased certificate/private-key entries; callers select a private key by
//! alias, sign arbitrary documents with it, and verify candidate signatures
//! against every public key the store holds.
//!
//! # Overview
//!
//! Two components, loaded bottom-up:
//!
//! ```text
//! CertificateStore (sealed container on disk)
//!   └── SignatureEngine (selected key + ordered public-key set)
//! ```
//!
//! - [`CertificateStore`] opens the sealed container, eagerly enumerates its
//!   aliased entries, and exposes certificates plus alias-scoped private-key
//!   retrieval. Private keys stay encrypted under their per-key passphrases
//!   until requested.
//! - [`SignatureEngine`] extracts every public key at construction, binds at
//!   most one private key via [`SignatureEngine::use_key`], signs with
//!   SHA-256/RSA (PKCS#1 v1.5), and verifies with any-of-N semantics: a
//!   signature is valid if at least one stored key validates it.
//!
//! # Quick Start
//!
//! ```no_run
//! use docsign::{CertificateStore, SignatureEngine};
//! # use anyhow::Result;
//! # fn example() -> Result<()> {
//!
//! let store = CertificateStore::open("input/client.store", "rcpxrcpx")?;
//! let mut engine = SignatureEngine::new(&store)?;
//! engine.use_key("client", "rcpx")?;
//!
//! let signature = engine.sign_document(b"some text document")?;
//! assert_eq!(signature.len(), 256);
//! assert!(engine.verify(b"some text document", &signature)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Overview
//!
//! ## [`certificate_store`]
//!
//! Read-only, eagerly-loaded view over the sealed container. Enumeration
//! order is the container's entry order and is stable across repeated opens.
//!
//! ## [`signature_engine`]
//!
//! The signing/verification core: algorithm binding, key selection with
//! last-write-wins rebinding, deterministic PKCS#1 v1.5 signing, and the
//! ordered any-of-N verification probe.
//!
//! ## [`container`]
//!
//! The on-disk store format: a tar archive of per-alias PEM entries sealed
//! with AES-GCM-256 under a PBKDF2-derived key. `container::seal` is the
//! write side used to produce store files.
//!
//! ## [`signature_archive`]
//!
//! Packages a signed document and its detached signature into a tar archive
//! for distribution.
//!
//! # Error Handling
//!
//! Store and engine operations return typed errors ([`StoreError`],
//! [`EngineError`]); every failure is routine and recoverable, surfaced to
//! the immediate caller. A signature that fails to validate is NOT an
//! error: [`SignatureEngine::verify`] returns `Ok(false)` for it and raises
//! only when the candidate's length is structurally wrong.

pub mod certificate_store;
pub mod config;
pub mod container;
pub mod error;
pub mod signature_archive;
pub mod signature_engine;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificate_store::CertificateStore;
pub use error::{EngineError, StoreError};
pub use signature_engine::{SignatureAlgorithm, SignatureEngine, RSA_2048_SIGNATURE_SIZE};
