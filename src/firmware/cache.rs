//! URL keyed firmware cache.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use sha2::{Digest, Sha256};

use super::checksum::Checksum;
use super::download::{Downloader, Fetch};
use crate::error::{Error, Result};
use crate::settings::Settings;

/// Firmware released from these repositories keeps its published file name in
/// the cache.
pub const TRUSTED_PREFIX: &str = "https://github.com/bigclownlabs/bcf-";

//==============================================================================
// Public Interface
//==============================================================================

/// Name of the cache file for `url`.
///
/// Releases from the trusted repositories are stored under the last segment of
/// their URL, anything else under the hex SHA-256 of the full URL.
pub fn cache_key(url: &str) -> String {
    if url.starts_with(TRUSTED_PREFIX) {
        if let Some((_, name)) = url.rsplit_once('/') {
            if !name.is_empty() && name != "." && name != ".." {
                return name.to_owned();
            }
        }
    }
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Downloaded firmware, one file per URL under a root directory.
///
/// A file present under its key is a cache hit, there is no other metadata.
#[derive(Debug)]
pub struct FirmwareCache<F: Fetch = Downloader> {
    root: PathBuf,
    fetcher: F,
    checksum: Option<Checksum>,
}

impl FirmwareCache<Downloader> {
    /// The cache described by `settings`, downloading over HTTP.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let checksum = settings
            .checksum
            .as_deref()
            .map(str::parse::<Checksum>)
            .transpose()?;
        let downloader = Downloader::new(settings.bar_width)?;
        Ok(Self::new(settings.cache_root()?, downloader).checksum(checksum))
    }
}

impl<F: Fetch> FirmwareCache<F> {
    /// A cache rooted at `root`. The directory is only created when something
    /// gets downloaded into it.
    pub fn new(root: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            root: root.into(),
            fetcher,
            checksum: None,
        }
    }

    /// Require the firmware to have this SHA-256. A cached file with another
    /// digest is downloaded again.
    pub fn checksum(mut self, checksum: Option<Checksum>) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the firmware of `url` is (or would be) cached.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(cache_key(url))
    }

    /// Returns a local file with the firmware of `url`, downloading it unless
    /// `use_cache` is set and it was downloaded before.
    pub fn resolve(&self, url: &str, use_cache: bool) -> Result<PathBuf> {
        let path = self.path_for(url);

        if use_cache && path.is_file() {
            match &self.checksum {
                None => {
                    debug!("cache hit for {}: {}", url, path.display());
                    return Ok(path);
                }
                Some(expected) => {
                    if Checksum::of_file(&path)? == *expected {
                        debug!("verified cache hit for {}: {}", url, path.display());
                        return Ok(path);
                    }
                    info!("cached {} does not match the expected checksum", path.display());
                }
            }
        }

        fs::create_dir_all(&self.root).map_err(|e| Error::io(&self.root, e))?;
        self.fetcher.fetch(url, &path, self.checksum.as_ref())?;
        Ok(path)
    }

    /// Lists the cached files with their size, sorted by name.
    pub fn entries(&self) -> Result<Vec<(String, u64)>> {
        let mut entries = vec![];
        for entry in self.read_root()? {
            let metadata = entry.metadata().map_err(|e| Error::io(entry.path(), e))?;
            if metadata.is_file() && !is_partial(&entry.path()) {
                let name = entry.file_name().to_string_lossy().into_owned();
                entries.push((name, metadata.len()));
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Removes every file from the cache, leftovers of interrupted downloads
    /// included, and returns how many were removed.
    pub fn clean(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in self.read_root()? {
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
                debug!("removed {}", path.display());
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn read_root(&self) -> Result<Vec<fs::DirEntry>> {
        match fs::read_dir(&self.root) {
            Ok(entries) => entries
                .collect::<std::io::Result<Vec<_>>>()
                .map_err(|e| Error::io(&self.root, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(Error::io(&self.root, e)),
        }
    }
}

//==============================================================================
// Private stuff
//==============================================================================

/// Temporary files of downloads killed before completion.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with(".bcf-"))
}

// =============================================================================
// Unit Tests
// =============================================================================
