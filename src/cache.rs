//! On-disk cache for generated graphics.
//!
//! Decoding, convolving and re-encoding is the expensive part of serving a
//! generated graphic. This module lets [`generate`](crate::generate) skip all
//! of it when the same source bytes were already processed with the same
//! parameters.
//!
//! ## Cache keys
//!
//! Lookups are **content-addressed** by a pair of SHA-256 digests:
//!
//! - **source hash**: digest of the source file bytes. Survives renames and
//!   `touch`, unlike mtimes.
//! - **params hash**: digest of everything that changes the output pixels or
//!   bytes: target box, rotation, filter, sharpening, kernel flags, center
//!   factor, output format and quality ([`hash_request_params`]).
//!
//! A hit requires an entry for the pair **and** the recorded output file still
//! being present in the output folder. A hit whose file has a different name
//! than the one now requested is copied instead of regenerated.
//!
//! The manifest itself is keyed by output filename. A file has exactly one
//! entry, so a file overwritten with other content can never be reported as a
//! hit for its old content. Filenames carry a [`content_fingerprint`] so that
//! different content never shares a file in the first place.
//!
//! ## Storage
//!
//! The manifest is a JSON file, `.dyngfx-cache.json`, inside the output folder.
//! A missing, corrupt or outdated manifest is treated as empty.

use crate::imaging::{OutputFormat, Quality, ResizeRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output folder.
const MANIFEST_FILENAME: &str = ".dyngfx-cache.json";

/// Hex characters of [`content_fingerprint`] kept in filenames.
const FINGERPRINT_LEN: usize = 10;

/// Bump to invalidate every existing cache when key computation changes.
const MANIFEST_VERSION: u32 = 2;

/// Content hashes an output file was generated from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

impl CacheEntry {
    fn content_key(&self) -> String {
        content_key(&self.source_hash, &self.params_hash)
    }
}

/// Persistent map from output filename to the content it was generated from.
///
/// Each filename maps to exactly one entry, so overwriting a file always
/// replaces the entry describing its old content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output filename, rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl CacheManifest {
    /// Empty manifest, used for `--no-cache` and first runs.
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from `output_dir`, falling back to an empty manifest.
    pub fn load(output_dir: &Path) -> Self {
        let path = manifest_path(output_dir);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(mut manifest) if manifest.version == MANIFEST_VERSION => {
                manifest.content_index = build_content_index(&manifest.entries);
                manifest
            }
            Ok(manifest) => {
                tracing::debug!(found = manifest.version, "cache manifest version mismatch");
                Self::empty()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache manifest");
                Self::empty()
            }
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Output filename recorded for this content, if the file still exists.
    ///
    /// The returned name may differ from the one the caller is about to
    /// write (same pixels requested under another stem); copying is then up
    /// to the caller.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let name = self.content_index.get(&content_key(source_hash, params_hash))?;
        output_dir.join(name).exists().then(|| name.clone())
    }

    /// Record `output` as generated from this content.
    ///
    /// Drops the entry previously describing `output` (the file was
    /// overwritten) and the entry previously holding this content under
    /// another name.
    pub fn insert(&mut self, output: String, source_hash: String, params_hash: String) {
        let entry = CacheEntry {
            source_hash,
            params_hash,
        };
        let key = entry.content_key();

        if let Some(previous) = self.entries.get(&output)
            && previous.content_key() != key
        {
            self.content_index.remove(&previous.content_key());
        }
        if let Some(old_output) = self.content_index.get(&key)
            && *old_output != output
        {
            self.entries.remove(old_output.as_str());
        }

        self.content_index.insert(key, output.clone());
        self.entries.insert(output, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build_content_index(entries: &BTreeMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(output, entry)| (entry.content_key(), output.clone()))
        .collect()
}

/// Path of the cache manifest for an output folder.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Short digest of a source/params pair, used to keep output filenames unique
/// per content.
pub fn content_fingerprint(source_hash: &str, params_hash: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(content_key(source_hash, params_hash)));
    digest[..FINGERPRINT_LEN].to_string()
}

/// SHA-256 over every parameter that affects a generated graphic.
pub fn hash_request_params(
    request: &ResizeRequest,
    format: OutputFormat,
    quality: Quality,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"dyngfx\0");
    hasher.update(request.width.to_le_bytes());
    hasher.update(request.height.to_le_bytes());
    hasher.update(format!("{:?}\0{:?}\0", request.rotation, request.filter).as_bytes());
    hasher.update(request.sharpening.radius.to_le_bytes());
    hasher.update(request.sharpening.intensity.to_le_bytes());
    hasher.update([
        request.kernel.include_edges as u8,
        request.kernel.preserve_transparency as u8,
    ]);
    hasher.update(request.kernel.center_factor.to_le_bytes());
    hasher.update(format.extension().as_bytes());
    hasher.update(quality.value().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache behavior over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} generated", self.misses);
        }
        write!(f, "{} cached", self.hits)?;
        if self.copies > 0 {
            write!(f, ", {} copied", self.copies)?;
        }
        write!(f, ", {} generated ({} total)", self.misses, self.total())
    }
}
