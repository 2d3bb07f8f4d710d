// src/cache.rs

//! Content-addressed extraction cache for embedded archives
//!
//! Embedded archive bytes are written to a location keyed by their SHA-256
//! hash, so identical bytes embedded by different parents are extracted once
//! and recognized as the same artifact. Writes go to a unique temp file in
//! the target directory followed by an atomic rename, so concurrent
//! extraction of the same content from separate runs or processes races
//! harmlessly and a reader never observes a partially-written file.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Result of placing one embedded archive into the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Hex SHA-256 of the archive bytes
    pub hash: String,
    /// Final on-disk location of the extracted bytes
    pub path: PathBuf,
    /// True when the content was already present and no write occurred
    pub cache_hit: bool,
}

/// Content-addressed store for extracted embedded archives
#[derive(Debug, Clone)]
pub struct ExtractionCache {
    root: PathBuf,
}

impl ExtractionCache {
    /// Open a cache rooted at the given directory, creating it if missing
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root)?;
            debug!("Created extraction cache directory: {:?}", root);
        }

        Ok(Self { root })
    }

    /// Ensure archive bytes are extracted, reusing any existing entry
    pub fn ensure(&self, content: &[u8]) -> Result<Extracted> {
        let hash = Self::hash_bytes(content);
        let path = self.path_for(&hash);

        if path.exists() {
            debug!("Embedded archive already extracted: {}", hash);
            return Ok(Extracted {
                hash,
                path,
                cache_hit: true,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Unique temp file in the target directory keeps the final rename on
        // one filesystem and atomic.
        let mut temp = NamedTempFile::new_in(path.parent().unwrap_or(&self.root)).map_err(
            |source| Error::Extraction {
                path: path.clone(),
                source,
            },
        )?;
        temp.write_all(content).map_err(|source| Error::Extraction {
            path: path.clone(),
            source,
        })?;
        temp.as_file()
            .sync_all()
            .map_err(|source| Error::Extraction {
                path: path.clone(),
                source,
            })?;

        if let Err(persist_err) = temp.persist(&path) {
            // A concurrent extraction of identical content may have renamed
            // into place first; that outcome is identical bytes, so take it.
            if path.exists() {
                debug!("Lost extraction race for {}, reusing winner", hash);
                return Ok(Extracted {
                    hash,
                    path,
                    cache_hit: true,
                });
            }
            return Err(Error::Extraction {
                path,
                source: persist_err.error,
            });
        }

        debug!(
            "Extracted embedded archive: {} ({} bytes)",
            hash,
            content.len()
        );
        Ok(Extracted {
            hash,
            path,
            cache_hit: false,
        })
    }

    /// Check whether content with the given hash is already extracted
    pub fn contains(&self, hash: &str) -> bool {
        self.path_for(hash).exists()
    }

    /// The on-disk location for a given hash
    ///
    /// Path format: root/{first2}/{remaining}, so the top level fans out
    /// into at most 256 directories.
    pub fn path_for(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.root.join(hash);
        }

        let (prefix, suffix) = hash.split_at(2);
        self.root.join(prefix).join(suffix)
    }

    /// Hex SHA-256 of the given bytes
    pub fn hash_bytes(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
