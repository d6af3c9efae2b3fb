//! Depth-first directory scanner.

use std::fs::{self, Metadata};
use std::path::Path;
use std::time::Instant;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use globset::GlobSet;
use tracing::{debug, info, trace, warn};

use dirtally_core::{FileClaim, FileId, NodeId, Root, ScanConfig, ScanError, ScanWarning};

/// Synchronous scanner that fills a [`Root`] from disk.
///
/// Every directory is listed, each entry is stat'ed without following links,
/// subdirectories are scanned before their parent is aggregated. Symbolic
/// links are recorded and never entered.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    ignore: GlobSet,
}

impl Scanner {
    /// Create a scanner, compiling the config's ignore patterns.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let ignore = config.ignore_matcher()?;
        Ok(Self { config, ignore })
    }

    /// Get the scan configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the configured root path into a new [`Root`].
    pub fn scan(&self) -> Result<Root, ScanError> {
        let root_path = self
            .config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&self.config.root, e))?;

        let mut root = Root::new(root_path);
        self.scan_into(&mut root)?;
        Ok(root)
    }

    /// Scan the path of an existing root into it.
    ///
    /// The root must be fresh: a top directory that already has children or a
    /// registry that already holds files is rejected before anything changes.
    pub fn scan_into(&self, root: &mut Root) -> Result<(), ScanError> {
        let start = Instant::now();
        let root_path = root.path().to_path_buf();

        if root.top_directory().count() > 0 || !root.registry().is_empty() {
            return Err(ScanError::InvalidConfig {
                message: format!("{} has already been scanned", root_path.display()),
            });
        }

        let metadata = fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let top = root.top();
        self.scan_directory(root, top, &root_path, get_dev(&metadata))?;

        let summary = root.top_directory();
        info!(
            path = %root_path.display(),
            files = summary.total_file_count(),
            directories = summary.total_subdirectory_count(),
            hardlinks = summary.total_hardlink_count(),
            warnings = root.warnings().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan finished"
        );
        Ok(())
    }

    /// List `path` into directory `dir`, recurse, then aggregate `dir`.
    fn scan_directory(
        &self,
        root: &mut Root,
        dir: NodeId,
        path: &Path,
        root_device: u64,
    ) -> Result<(), ScanError> {
        let started = Instant::now();
        debug!(path = %path.display(), "scanning directory");

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) if self.config.keep_going && dir != root.top() => {
                warn!(path = %path.display(), error = %err, "unreadable directory kept empty");
                root.push_warning(ScanWarning::read_error(path, &err));
                root.mark_unreadable(dir)?;
                return self.finish_directory(root, dir, started);
            }
            Err(err) => return Err(ScanError::io(path, err)),
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if self.config.keep_going => {
                    warn!(path = %path.display(), error = %err, "failed to read directory entry");
                    root.push_warning(ScanWarning::read_error(path, &err));
                    continue;
                }
                Err(err) => return Err(ScanError::io(path, err)),
            };

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if self.ignore.is_match(&*name) || self.config.should_skip_hidden(&name) {
                trace!(name = %name, "ignored");
                continue;
            }

            let entry_path = entry.path();
            let Some(metadata) = self.stat_entry(root, &entry_path)? else {
                continue;
            };

            let file_type = metadata.file_type();
            if file_type.is_dir() {
                if !self.may_enter(root, &entry_path, &metadata, root_device) {
                    continue;
                }

                let child = root.new_directory(&entry_path);
                root.attach(dir, child)?;
                self.scan_directory(root, child, &entry_path, root_device)?;
            } else if file_type.is_symlink() {
                let target = fs::read_link(&entry_path).ok();
                let link = root.new_symlink(&entry_path, target);
                root.attach(dir, link)?;
            } else if file_type.is_file() {
                let id = get_file_id(&metadata);
                let claim = root.add_file(dir, &entry_path, metadata.len(), id)?;
                if let FileClaim::Hardlink { .. } = claim {
                    trace!(path = %entry_path.display(), "hardlink to a file already counted");
                }
            } else {
                let kind = describe_file_type(&metadata);
                warn!(path = %entry_path.display(), kind, "skipping unsupported entry");
                root.push_warning(ScanWarning::unsupported(&entry_path, kind));
            }
        }

        self.finish_directory(root, dir, started)
    }

    /// Stat an entry without following links.
    ///
    /// `None` means the entry was skipped and a warning recorded: it vanished
    /// since the listing, or it failed to stat in keep-going mode.
    fn stat_entry(&self, root: &mut Root, path: &Path) -> Result<Option<Metadata>, ScanError> {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "entry vanished during scan");
                root.push_warning(ScanWarning::vanished(path));
                Ok(None)
            }
            Err(err) if self.config.keep_going => {
                warn!(path = %path.display(), error = %err, "failed to stat entry");
                root.push_warning(ScanWarning::read_error(path, &err));
                Ok(None)
            }
            Err(err) => Err(ScanError::io(path, err)),
        }
    }

    /// Whether a subdirectory may be descended into from `root_device`.
    fn may_enter(
        &self,
        root: &mut Root,
        path: &Path,
        metadata: &Metadata,
        root_device: u64,
    ) -> bool {
        if self.config.cross_filesystems || get_dev(metadata) == root_device {
            return true;
        }
        debug!(path = %path.display(), "not crossing filesystem boundary");
        root.push_warning(ScanWarning::cross_filesystem(path));
        false
    }

    fn finish_directory(
        &self,
        root: &mut Root,
        dir: NodeId,
        started: Instant,
    ) -> Result<(), ScanError> {
        let scanned = started.elapsed();
        let aggregate_start = Instant::now();
        root.aggregate(dir)?;
        root.set_durations(dir, scanned, aggregate_start.elapsed())?;
        Ok(())
    }
}

// Cross-platform metadata helpers

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &Metadata) -> u64 {
    0
}

/// Get the hardlink identity of a regular file.
#[cfg(unix)]
fn get_file_id(metadata: &Metadata) -> Option<FileId> {
    Some(FileId::new(metadata.ino(), metadata.dev()))
}

// Without inode numbers every name counts as its own file.
#[cfg(not(unix))]
fn get_file_id(_metadata: &Metadata) -> Option<FileId> {
    None
}

#[cfg(unix)]
fn describe_file_type(metadata: &Metadata) -> &'static str {
    use std::os::unix::fs::FileTypeExt;

    let file_type = metadata.file_type();
    if file_type.is_fifo() {
        "fifo"
    } else if file_type.is_socket() {
        "socket"
    } else if file_type.is_block_device() {
        "block device"
    } else if file_type.is_char_device() {
        "character device"
    } else {
        "unknown entry"
    }
}

#[cfg(not(unix))]
fn describe_file_type(_metadata: &Metadata) -> &'static str {
    "unknown entry"
}
