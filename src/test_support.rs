//! Fixtures for store and engine tests: throwaway keys, minimal self-signed
//! certificates, and sealed store files on disk.

use std::io::Write;

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::symm::Cipher;
use openssl::x509::{X509Name, X509};
use tempfile::NamedTempFile;

use crate::container::{self, ContainerEntry};

pub const STORE_PASSPHRASE: &str = "rcpxrcpx";
pub const KEY_PASSPHRASE: &str = "rcpx";
pub const CLIENT_ALIAS: &str = "client";

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2

/// A store entry backed by a fresh RSA-2048 key.
pub fn rsa_entry(alias: &str, key_passphrase: &str) -> ContainerEntry {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();
    entry_for(alias, &key, key_passphrase)
}

/// A store entry backed by a P-256 EC key, for unsupported-algorithm cases.
pub fn ec_entry(alias: &str, key_passphrase: &str) -> ContainerEntry {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let ec = EcKey::generate(&group).unwrap();
    let key = PKey::from_ec_key(ec).unwrap();
    entry_for(alias, &key, key_passphrase)
}

fn entry_for(alias: &str, key: &PKey<Private>, key_passphrase: &str) -> ContainerEntry {
    let certificate = self_signed(key, alias);
    ContainerEntry {
        alias: alias.to_string(),
        certificate_pem: certificate.to_pem().unwrap(),
        key_pem: key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), key_passphrase.as_bytes())
            .unwrap(),
    }
}

fn self_signed(key: &PKey<Private>, common_name: &str) -> X509 {
    let mut name_builder = X509Name::builder().unwrap();
    name_builder
        .append_entry_by_nid(Nid::COMMONNAME, common_name)
        .unwrap();
    let name = name_builder.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(X509_VERSION_3).unwrap();

    let mut serial = BigNum::new().unwrap();
    serial.rand(128, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();

    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.set_pubkey(key).unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// Seal `entries` into a store file. The returned handle keeps the file
/// alive for the duration of the test.
pub fn write_store(entries: &[ContainerEntry], passphrase: &str) -> NamedTempFile {
    let sealed = container::seal(entries, passphrase).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&sealed).unwrap();
    file.flush().unwrap();
    file
}

/// The standard single-entry fixture: alias `client`, store passphrase
/// `rcpxrcpx`, key passphrase `rcpx`.
pub fn client_store() -> NamedTempFile {
    write_store(&[rsa_entry(CLIENT_ALIAS, KEY_PASSPHRASE)], STORE_PASSPHRASE)
}
