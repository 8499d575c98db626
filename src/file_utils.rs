use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

// @module: File utilities and document identity

/// Hex characters kept from the content hash
const DOCUMENT_ID_LEN: usize = 16;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a UTF-8 screenplay text, dropping a leading byte order mark
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document: {:?}", path.as_ref()))?;

        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

/// Stable document id: leading hex of the SHA-256 of the text
pub fn document_id_for(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut id: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
    id.truncate(DOCUMENT_ID_LEN);
    id
}
