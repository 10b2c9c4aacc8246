//! Sealed credential container
//!
//! The on-disk format behind [`crate::CertificateStore`]. The payload is a
//! tar archive holding two members per alias, in store enumeration order:
//!
//! ```text
//! <alias>.cert.pem   X.509 certificate, PEM
//! <alias>.key.pem    PKCS#8 private key PEM, encrypted under the per-key passphrase
//! ```
//!
//! The whole payload is sealed with AES-GCM-256 under a key derived from the
//! store passphrase with PBKDF2-HMAC-SHA256:
//!
//! ```text
//! [Salt (16)]
//! [Nonce (12)]
//! [Authentication Tag (16)]
//! [Payload Length (4 bytes, u32 LE)]
//! [Encrypted Payload (variable, AES-GCM encrypted tar)]
//! ```
//!
//! GCM authenticates the payload, so a wrong passphrase and a tampered body
//! are indistinguishable: both fail tag verification and surface as
//! [`StoreError::BadPassphrase`]. Everything structurally wrong before the
//! tag check is [`StoreError::Malformed`].

use std::io::Read;

use openssl::hash::MessageDigest;
use openssl::symm::Cipher;

use crate::error::StoreError;

/// Size of the PBKDF2 salt (128 bits = 16 bytes)
pub const SALT_SIZE: usize = 16;
/// Size of the AES-GCM nonce (96 bits = 12 bytes)
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag (128 bits = 16 bytes)
pub const TAG_SIZE: usize = 16;
/// Size of the payload length field in the sealed format (u32 = 4 bytes)
pub const PAYLOAD_LEN_SIZE: usize = 4;

const AES_256_KEY_SIZE: usize = 32;
const PBKDF2_ROUNDS: usize = 100_000;

const CERT_SUFFIX: &str = ".cert.pem";
const KEY_SUFFIX: &str = ".key.pem";

/// One aliased entry of the container: a certificate plus its
/// passphrase-protected private key, both PEM.
#[derive(Debug, Clone)]
pub struct ContainerEntry {
    pub alias: String,
    pub certificate_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Seal `entries` into the container byte format. Entry order is preserved
/// and becomes the store enumeration order on [`unseal`].
pub fn seal(entries: &[ContainerEntry], passphrase: &str) -> Result<Vec<u8>, StoreError> {
    let payload = pack_entries(entries)?;
    seal_payload(&payload, passphrase)
}

/// Unseal container bytes and return its entries in enumeration order.
pub fn unseal(sealed: &[u8], passphrase: &str) -> Result<Vec<ContainerEntry>, StoreError> {
    let payload = open_payload(sealed, passphrase)?;
    unpack_entries(&payload)
}

pub(crate) fn seal_payload(payload: &[u8], passphrase: &str) -> Result<Vec<u8>, StoreError> {
    let mut salt = [0u8; SALT_SIZE];
    openssl::rand::rand_bytes(&mut salt)?;
    let mut nonce = [0u8; NONCE_SIZE];
    openssl::rand::rand_bytes(&mut nonce)?;

    let key = derive_key(passphrase, &salt)?;
    let mut tag = [0u8; TAG_SIZE];
    let ciphertext = openssl::symm::encrypt_aead(
        Cipher::aes_256_gcm(),
        &key,
        Some(&nonce),
        &[],
        payload,
        &mut tag,
    )?;

    let mut sealed = Vec::with_capacity(
        SALT_SIZE + NONCE_SIZE + TAG_SIZE + PAYLOAD_LEN_SIZE + ciphertext.len(),
    );
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&tag);
    sealed.extend_from_slice(&(ciphertext.len() as u32).to_le_bytes());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open_payload(sealed: &[u8], passphrase: &str) -> Result<Vec<u8>, StoreError> {
    let mut offset = 0;

    if sealed.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE + PAYLOAD_LEN_SIZE {
        return Err(StoreError::Malformed(
            "sealed container too short to contain its header".to_string(),
        ));
    }

    let salt = &sealed[offset..offset + SALT_SIZE];
    offset += SALT_SIZE;

    let nonce = &sealed[offset..offset + NONCE_SIZE];
    offset += NONCE_SIZE;

    let tag = &sealed[offset..offset + TAG_SIZE];
    offset += TAG_SIZE;

    let payload_len = u32::from_le_bytes(
        sealed[offset..offset + PAYLOAD_LEN_SIZE]
            .try_into()
            .expect("slice has PAYLOAD_LEN_SIZE bytes"),
    ) as usize;
    offset += PAYLOAD_LEN_SIZE;

    if sealed.len() - offset != payload_len {
        return Err(StoreError::Malformed(format!(
            "sealed container payload length mismatch: header says {}, found {}",
            payload_len,
            sealed.len() - offset
        )));
    }

    let key = derive_key(passphrase, salt)?;
    openssl::symm::decrypt_aead(
        Cipher::aes_256_gcm(),
        &key,
        Some(nonce),
        &[],
        &sealed[offset..],
        tag,
    )
    .map_err(|_| StoreError::BadPassphrase)
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; AES_256_KEY_SIZE], StoreError> {
    let mut key = [0u8; AES_256_KEY_SIZE];
    openssl::pkcs5::pbkdf2_hmac(
        passphrase.as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        MessageDigest::sha256(),
        &mut key,
    )?;
    Ok(key)
}

fn pack_entries(entries: &[ContainerEntry]) -> Result<Vec<u8>, StoreError> {
    let mut builder = tar::Builder::new(Vec::new());
    for entry in entries {
        append_member(
            &mut builder,
            &format!("{}{}", entry.alias, CERT_SUFFIX),
            &entry.certificate_pem,
        )?;
        append_member(
            &mut builder,
            &format!("{}{}", entry.alias, KEY_SUFFIX),
            &entry.key_pem,
        )?;
    }
    Ok(builder.into_inner()?)
}

fn append_member(
    builder: &mut tar::Builder<Vec<u8>>,
    name: &str,
    data: &[u8],
) -> Result<(), StoreError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o400); // Read-only permissions
    header.set_cksum();
    builder.append_data(&mut header, name, data)?;
    Ok(())
}

fn unpack_entries(payload: &[u8]) -> Result<Vec<ContainerEntry>, StoreError> {
    // First-seen order of aliases is the enumeration order
    let mut aliases: Vec<String> = Vec::new();
    let mut partial: Vec<(Option<Vec<u8>>, Option<Vec<u8>>)> = Vec::new();

    let mut archive = tar::Archive::new(payload);
    let members = archive
        .entries()
        .map_err(|e| StoreError::Malformed(format!("unreadable container payload: {}", e)))?;

    for member in members {
        let mut member =
            member.map_err(|e| StoreError::Malformed(format!("corrupt container member: {}", e)))?;

        match member.header().entry_type() {
            tar::EntryType::Regular => {}
            _ => {
                // Skip non-regular files
                continue;
            }
        }

        let file_name = member
            .path()
            .map_err(|e| StoreError::Malformed(format!("corrupt member path: {}", e)))?
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
            .to_string();

        let mut data = Vec::new();
        member
            .read_to_end(&mut data)
            .map_err(|e| StoreError::Malformed(format!("truncated member '{}': {}", file_name, e)))?;

        let (alias, slot_is_cert) = if let Some(alias) = file_name.strip_suffix(CERT_SUFFIX) {
            (alias.to_string(), true)
        } else if let Some(alias) = file_name.strip_suffix(KEY_SUFFIX) {
            (alias.to_string(), false)
        } else {
            return Err(StoreError::Malformed(format!(
                "unexpected container member '{}'",
                file_name
            )));
        };

        let index = match aliases.iter().position(|a| *a == alias) {
            Some(index) => index,
            None => {
                aliases.push(alias.clone());
                partial.push((None, None));
                partial.len() - 1
            }
        };

        let slot = if slot_is_cert {
            &mut partial[index].0
        } else {
            &mut partial[index].1
        };
        if slot.is_some() {
            return Err(StoreError::Malformed(format!(
                "duplicate alias '{}' in container",
                alias
            )));
        }
        *slot = Some(data);
    }

    aliases
        .into_iter()
        .zip(partial)
        .map(|(alias, slots)| match slots {
            (Some(certificate_pem), Some(key_pem)) => Ok(ContainerEntry {
                alias,
                certificate_pem,
                key_pem,
            }),
            (None, _) => Err(StoreError::Malformed(format!(
                "alias '{}' has no certificate member",
                alias
            ))),
            (_, None) => Err(StoreError::Malformed(format!(
                "alias '{}' has no private key member",
                alias
            ))),
        })
        .collect()
}
