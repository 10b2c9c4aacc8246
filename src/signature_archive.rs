//! Packages a signed document together with its detached signature into a
//! tar archive. The signature is written as an opaque blob next to the
//! document, named `<document>.sig` by convention.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tar::{Builder, Header};

/// Tar archive writer for signed-document bundles.
pub struct SignatureArchive {
    builder: Builder<File>,
}

impl std::fmt::Debug for SignatureArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureArchive").finish_non_exhaustive()
    }
}

impl SignatureArchive {
    /// Create a new archive at `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create archive at {}", path.display()))?;
        Ok(Self {
            builder: Builder::new(file),
        })
    }

    /// Append an existing file under its bare file name.
    pub fn append_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Archive member has no usable file name: {}", path.display()))?;

        let mut file = File::open(path)
            .with_context(|| format!("Failed to open archive member {}", path.display()))?;
        self.builder
            .append_file(name, &mut file)
            .with_context(|| format!("Failed to append file {} to archive", name))
    }

    /// Append a raw signature blob as the member `name`.
    pub fn append_signature(&mut self, name: &str, signature: &[u8]) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_size(signature.len() as u64);
        header.set_mode(0o400); // Read-only permissions
        header.set_cksum();
        self.builder
            .append_data(&mut header, name, signature)
            .with_context(|| format!("Failed to append signature {} to archive", name))
    }

    /// Write the trailing archive blocks and close the file. Dropping the
    /// archive without calling this leaves it unterminated.
    pub fn finish(mut self) -> Result<()> {
        self.builder.finish().context("Failed to finalize archive")
    }
}
