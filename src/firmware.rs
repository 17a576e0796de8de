//! Firmware download and local cache.
//!
//! Firmware images are identified by their URL. The [`FirmwareCache`] maps a
//! URL to a file under the cache directory and only reaches for the network
//! (through the [`Downloader`]) when that file is not there yet.
//!
//! ```no_run
//! use bcf::{FirmwareCache, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new().finalize();
//! let cache = FirmwareCache::from_settings(&settings)?;
//! let path = cache.resolve("https://example.com/fw.bin", settings.use_cache)?;
//! println!("{}", path.display());
//! # Ok::<(), bcf::Error>(())
//! ```

mod cache;
mod checksum;
mod download;

pub use cache::{cache_key, FirmwareCache, TRUSTED_PREFIX};
pub use checksum::Checksum;
pub use download::{Downloader, Fetch, CHUNK_SIZE};
