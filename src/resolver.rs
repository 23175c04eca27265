use crate::MedrenError;
use crate::backends::{BackendKind, BackendOutcome, MetadataBackend, ToolPaths, normalized_extension};
use crate::record::MetadataRecord;
use crate::time::timezone::{TimezoneLookup, TzfLookup};
use bon::bon;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A resolved record together with the file it describes.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFile {
    pub path: PathBuf,
    #[serde(flatten)]
    pub record: MetadataRecord,
}

/// Walks the metadata backends in priority order until one of them yields a
/// usable capture time.
///
/// The set of available backends is probed once, when the resolver is built, so
/// a single instance should be reused for a whole batch of files.
///
/// ```rust,no_run
/// # use medren::{BackendKind, MedrenError, Resolver};
/// # use std::path::Path;
/// # fn main() -> Result<(), MedrenError> {
/// let resolver = Resolver::builder()
///     .backends(vec![BackendKind::NomExif, BackendKind::ExifTool])
///     .build()?;
/// if let Some(record) = resolver.resolve(Path::new("IMG_20240501_203015.jpg")) {
///     println!("{:?} by {}", record.capture_timestamp, record.backend);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Resolver {
    backends: Vec<Box<dyn MetadataBackend>>,
    timezone: Box<dyn TimezoneLookup>,
    check_location_offset: bool,
    parallel: bool,
}

#[bon]
impl Resolver {
    /// Constructs a `Resolver`, probing every requested backend.
    ///
    /// # Builder Arguments
    ///
    /// * `backends: Option<Vec<BackendKind>>` - Backends to try, in priority order. Defaults to [`BackendKind::ALL`]. Duplicates are ignored.
    /// * `exiftool_path: Option<PathBuf>` - A specific `exiftool` executable. If `None`, `exiftool` is searched for in the system's PATH.
    /// * `hachoir_path`, `mediainfo_path`, `ffprobe_path: Option<PathBuf>` - Same, for `hachoir-metadata`, `mediainfo` and `ffprobe`.
    /// * `check_location_offset: bool` - (Default: `true`) Compare metadata UTC offsets with the offset at the GPS position.
    /// * `parallel: bool` - (Default: `false`) Let [`Resolver::resolve_all`] process files on the rayon thread pool.
    ///
    /// # Errors
    ///
    /// [`MedrenError::NoBackendsAvailable`] when none of the requested backends can run.
    #[builder]
    pub fn new(
        backends: Option<Vec<BackendKind>>,
        exiftool_path: Option<PathBuf>,
        hachoir_path: Option<PathBuf>,
        mediainfo_path: Option<PathBuf>,
        ffprobe_path: Option<PathBuf>,
        #[builder(default = true)] check_location_offset: bool,
        #[builder(default)] parallel: bool,
    ) -> Result<Self, MedrenError> {
        let defaults = ToolPaths::default();
        let tools = ToolPaths {
            exiftool: exiftool_path,
            hachoir: hachoir_path.unwrap_or(defaults.hachoir),
            mediainfo: mediainfo_path.unwrap_or(defaults.mediainfo),
            ffprobe: ffprobe_path.unwrap_or(defaults.ffprobe),
        };

        let mut kinds = backends.unwrap_or_else(|| BackendKind::ALL.to_vec());
        let mut seen = Vec::with_capacity(kinds.len());
        kinds.retain(|kind| {
            let first = !seen.contains(kind);
            seen.push(*kind);
            first
        });

        let active = kinds
            .into_iter()
            .filter_map(|kind| match kind.probe(&tools) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    info!("Backend {kind} is unavailable: {e}");
                    None
                }
            })
            .collect();

        Ok(Self::with_backends(active)?
            .with_location_check(check_location_offset)
            .with_parallel(parallel))
    }

    /// Builds a resolver over already constructed backends, tried in the given order.
    ///
    /// # Errors
    ///
    /// [`MedrenError::NoBackendsAvailable`] when `backends` is empty.
    pub fn with_backends(backends: Vec<Box<dyn MetadataBackend>>) -> Result<Self, MedrenError> {
        if backends.is_empty() {
            return Err(MedrenError::NoBackendsAvailable);
        }
        Ok(Self {
            backends,
            timezone: Box::new(TzfLookup),
            check_location_offset: true,
            parallel: false,
        })
    }

    #[must_use]
    pub fn with_timezone_lookup(mut self, lookup: impl TimezoneLookup + 'static) -> Self {
        self.timezone = Box::new(lookup);
        self
    }

    #[must_use]
    pub fn with_location_check(mut self, enabled: bool) -> Self {
        self.check_location_offset = enabled;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// The backends that survived probing, in the order they are tried.
    pub fn active_backends(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Resolves the metadata of one file.
    ///
    /// Backends that do not support the file's extension are skipped; the first
    /// one that finds a valid capture time wins and no later backend runs. Returns
    /// `None` when no backend succeeds or `path` is not a regular file.
    pub fn resolve(&self, path: &Path) -> Option<MetadataRecord> {
        if !path.is_file() {
            warn!("{} is not a regular file", path.display());
            return None;
        }
        let extension = normalized_extension(path);

        for backend in &self.backends {
            let kind = backend.kind();
            if !backend.supports(&extension) {
                debug!("{kind} does not read {extension:?} files");
                continue;
            }
            match backend.extract(path) {
                BackendOutcome::Found(mut record) => {
                    if self.check_location_offset {
                        record.validate_consistency(self.timezone.as_ref());
                    }
                    debug!("{kind} resolved {}", path.display());
                    return Some(record);
                }
                BackendOutcome::NotFound => {
                    debug!("{kind} found no capture time in {}", path.display());
                }
                BackendOutcome::Failed(e) => {
                    debug!("{kind} failed on {}: {e}", path.display());
                }
            }
        }
        warn!("No backend found a capture time for {}", path.display());
        None
    }

    /// Resolves a batch of files, dropping the ones without metadata.
    ///
    /// The result is ordered by capture time; files with equal times keep their
    /// input order, so parallel and sequential runs agree.
    pub fn resolve_all(&self, paths: &[PathBuf]) -> Vec<ResolvedFile> {
        let resolve_one = |path: &PathBuf| {
            if !path.is_file() {
                debug!("Skipping {}, not a regular file", path.display());
                return None;
            }
            self.resolve(path).map(|record| ResolvedFile {
                path: path.clone(),
                record,
            })
        };

        let mut resolved: Vec<ResolvedFile> = if self.parallel {
            paths.par_iter().filter_map(resolve_one).collect()
        } else {
            paths.iter().filter_map(resolve_one).collect()
        };
        resolved.sort_by_key(|file| {
            let ts = file.record.capture_timestamp;
            (ts.is_none(), ts)
        });
        resolved
    }
}
