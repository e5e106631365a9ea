//! Generation of cached graphics from source images.
//!
//! This is the host layer around the pixel core. It reads sources, names
//! outputs, consults the [`cache`](crate::cache), decodes and encodes through
//! an [`ImageCodec`] and writes results to disk.
//!
//! ## Flow for one source
//!
//! ```text
//! validate request ─► read bytes ─► hash ─► cache hit? ──yes──► reuse / copy
//!                                              │
//!                                              no
//!                                              ▼
//!                    decode ─► plan ─► rotate/resize/sharpen ─► encode ─► write
//! ```
//!
//! Failures propagate unchanged and never leave an artifact: encoded bytes go
//! to a temporary file that is renamed into place only once fully written.
//!
//! ## Parallel Processing
//!
//! [`generate_all`] processes sources in parallel with rayon. The cache
//! manifest is shared behind a `Mutex` and saved once at the end.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::Config;
use crate::imaging::{
    BackendError, ConvolutionKernel, ImageCodec, ImagingError, OutputFormat, PixelBuffer, Quality,
    ResizeRequest, pipeline, validate_intensity,
};
use crate::naming;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Where and how generated graphics are persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSettings {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl GenerateSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output.folder.clone(),
            format: config.output.format,
            quality: config.quality(),
        }
    }
}

/// What happened for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The requested file already existed in the cache.
    Cached(PathBuf),
    /// Identical content existed under another name and was copied.
    Copied(PathBuf),
    /// The graphic was decoded, processed and encoded.
    Generated(PathBuf),
}

impl GenerateOutcome {
    pub fn path(&self) -> &Path {
        match self {
            GenerateOutcome::Cached(p)
            | GenerateOutcome::Copied(p)
            | GenerateOutcome::Generated(p) => p,
        }
    }

    fn record(&self, stats: &mut CacheStats) {
        match self {
            GenerateOutcome::Cached(_) => stats.hit(),
            GenerateOutcome::Copied(_) => stats.copy(),
            GenerateOutcome::Generated(_) => stats.miss(),
        }
    }
}

/// Generate (or reuse) the graphic for one source.
#[tracing::instrument(skip(codec, settings, cache), fields(source = %source.display()))]
pub fn generate(
    codec: &impl ImageCodec,
    source: &Path,
    request: &ResizeRequest,
    settings: &GenerateSettings,
    cache: &Mutex<CacheManifest>,
) -> Result<GenerateOutcome, GenerateError> {
    request.validate()?;
    if !source.is_file() {
        return Err(GenerateError::SourceNotFound(source.to_path_buf()));
    }

    let bytes = fs::read(source)?;
    let source_hash = cache::hash_bytes(&bytes);
    let params_hash = cache::hash_request_params(request, settings.format, settings.quality);
    let fingerprint = cache::content_fingerprint(&source_hash, &params_hash);
    let filename = naming::output_filename(
        &naming::source_stem(source),
        request,
        settings.format,
        &fingerprint,
    );
    let output = settings.output_dir.join(&filename);

    let cached = lock(cache).find_cached(&source_hash, &params_hash, &settings.output_dir);
    if let Some(existing) = cached {
        if existing == filename {
            tracing::debug!(output = %output.display(), "cache hit");
            return Ok(GenerateOutcome::Cached(output));
        }
        tracing::debug!(from = %existing, to = %filename, "cache hit under another name");
        fs::copy(settings.output_dir.join(&existing), &output)?;
        lock(cache).insert(filename, source_hash, params_hash);
        return Ok(GenerateOutcome::Copied(output));
    }

    let decoded = codec.decode(&bytes)?;
    let processed = pipeline::resize_and_sharpen(&decoded, request)?;
    warn_on_lost_alpha(&processed, settings.format);
    let encoded = codec.encode(&processed, settings.format, settings.quality)?;
    write_atomic(&output, &encoded)?;

    lock(cache).insert(filename, source_hash, params_hash);
    tracing::info!(
        output = %output.display(),
        width = processed.width(),
        height = processed.height(),
        "generated"
    );
    Ok(GenerateOutcome::Generated(output))
}

/// Results of a [`generate_all`] run, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<(PathBuf, Result<GenerateOutcome, GenerateError>)>,
    pub cache_stats: CacheStats,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Generate graphics for many sources in parallel, sharing one cache manifest.
///
/// With `use_cache = false` the run starts from an empty manifest, so every
/// source is regenerated; the manifest is still written afterwards.
pub fn generate_all(
    codec: &impl ImageCodec,
    sources: &[PathBuf],
    request: &ResizeRequest,
    settings: &GenerateSettings,
    use_cache: bool,
) -> Result<BatchReport, GenerateError> {
    request.validate()?;
    fs::create_dir_all(&settings.output_dir)?;

    let manifest = if use_cache {
        CacheManifest::load(&settings.output_dir)
    } else {
        CacheManifest::empty()
    };
    let cache = Mutex::new(manifest);

    let results: Vec<_> = sources
        .par_iter()
        .map(|source| {
            let result = generate(codec, source, request, settings, &cache);
            if let Err(e) = &result {
                tracing::warn!(source = %source.display(), error = %e, "generation failed");
            }
            (source.clone(), result)
        })
        .collect();

    let mut cache_stats = CacheStats::default();
    for outcome in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        outcome.record(&mut cache_stats);
    }

    let manifest = cache.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    manifest.save(&settings.output_dir)?;

    Ok(BatchReport {
        results,
        cache_stats,
    })
}

/// How a standalone filter run uses its kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterMode {
    Blur,
    Sharpen { intensity: f32 },
}

/// Convolve one file with `kernel` (no resize) and write the result to `output`.
pub fn filter_file(
    codec: &impl ImageCodec,
    source: &Path,
    output: &Path,
    kernel: &ConvolutionKernel,
    mode: FilterMode,
    (format, quality): (OutputFormat, Quality),
) -> Result<(), GenerateError> {
    if let FilterMode::Sharpen { intensity } = mode {
        validate_intensity(intensity)?;
    }
    if !source.is_file() {
        return Err(GenerateError::SourceNotFound(source.to_path_buf()));
    }
    let decoded = codec.decode(&fs::read(source)?)?;
    let filtered = match mode {
        FilterMode::Blur => kernel.blur(&decoded),
        FilterMode::Sharpen { intensity } => kernel.unsharp_mask(&decoded, intensity),
    };
    warn_on_lost_alpha(&filtered, format);
    let encoded = codec.encode(&filtered, format, quality)?;
    write_atomic(output, &encoded)?;
    tracing::info!(output = %output.display(), size = kernel.size(), ?mode, "filtered");
    Ok(())
}

fn warn_on_lost_alpha(buffer: &PixelBuffer, format: OutputFormat) {
    if !format.supports_alpha() && buffer.as_raw().chunks_exact(4).any(|px| px[3] < u8::MAX) {
        tracing::warn!(%format, "output format has no alpha channel, transparency is dropped");
    }
}

fn lock(cache: &Mutex<CacheManifest>) -> std::sync::MutexGuard<'_, CacheManifest> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Disambiguates temporary files of concurrent writes within this process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` next to `path` under a temporary name, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_file_name(format!(".{name}.{}-{seq}.tmp", std::process::id()));

    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
