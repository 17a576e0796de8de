//! Settings related to device selection and the firmware cache.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Name of the directory created under the user cache root.
pub const CACHE_DIR_NAME: &str = "bcf";

/// Number of cells in the download progress bar.
pub const DEFAULT_BAR_WIDTH: usize = 20;

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings used by `bcf` and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The device path given on the command line. When not set, the user is
    /// asked to pick one of the connected devices.
    pub device: Option<String>,
    /// Also list the stable symlinks (e.g. `/dev/serial/by-id/...`) pointing
    /// at serial devices, on platforms that have them.
    pub include_aliases: bool,

    /// Root directory of the firmware cache. When not set, the per-user cache
    /// directory of the platform is used.
    pub cache_dir: Option<PathBuf>,
    /// Reuse previously downloaded firmware instead of fetching it again.
    pub use_cache: bool,
    /// Expected SHA-256 of the firmware, hex encoded.
    pub checksum: Option<String>,

    /// Number of cells in the progress bar.
    pub bar_width: usize,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

impl Settings {
    /// The directory holding cached firmware: the explicitly configured one,
    /// or `bcf` under the user cache root of the platform.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|root| root.join(CACHE_DIR_NAME))
                .ok_or(Error::NoCacheDir),
        }
    }
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// let settings = bcf::SettingsBuilder::new().device("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.device.as_deref(), Some("/dev/ttyUSB0"));
/// ```
#[derive(Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    /// Start building the settings using default values, no device and the
    /// platform cache directory.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                device: None,
                include_aliases: false,
                cache_dir: None,
                use_cache: true,
                checksum: None,
                bar_width: DEFAULT_BAR_WIDTH,
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial device
    pub fn device<'a>(mut self, device: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.device = Some(device.into().into_owned());
        self
    }

    /// List symlinked aliases of serial devices too
    pub fn include_aliases(mut self, include_aliases: bool) -> Self {
        self.settings.include_aliases = include_aliases;
        self
    }

    /// Set the firmware cache directory
    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.settings.cache_dir = Some(cache_dir.into());
        self
    }

    /// Enable or disable reuse of cached firmware
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.settings.use_cache = use_cache;
        self
    }

    /// Set the expected SHA-256 of the firmware
    pub fn checksum<'a>(mut self, checksum: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.checksum = Some(checksum.into().into_owned());
        self
    }

    /// Set the number of cells of the progress bar
    pub fn bar_width(mut self, bar_width: usize) -> Self {
        self.settings.bar_width = bar_width;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            device: None,
            include_aliases: false,
            cache_dir: None,
            use_cache: true,
            checksum: None,
            bar_width: 20,
            _private_use_builder: (),
        }
    )
}

#[test]
fn device() {
    let settings = SettingsBuilder::new().device("/dev/ttyUSB0").finalize();
    assert_eq!(settings.device.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn include_aliases() {
    let settings = SettingsBuilder::new().include_aliases(true).finalize();
    assert!(settings.include_aliases);
}

#[test]
fn use_cache() {
    let settings = SettingsBuilder::new().use_cache(false).finalize();
    assert!(!settings.use_cache);
}

#[test]
fn checksum() {
    let settings = SettingsBuilder::new().checksum("abcd").finalize();
    assert_eq!(settings.checksum.unwrap(), "abcd");
}

#[test]
fn bar_width() {
    let settings = SettingsBuilder::new().bar_width(40).finalize();
    assert_eq!(settings.bar_width, 40);
}

#[test]
fn explicit_cache_dir_wins() {
    let settings = SettingsBuilder::new().cache_dir("/tmp/fw-cache").finalize();
    assert_eq!(
        settings.cache_root().unwrap(),
        PathBuf::from("/tmp/fw-cache")
    );
}

#[test]
fn default_cache_dir_ends_with_tool_name() {
    let settings = SettingsBuilder::new().finalize();
    if let Ok(root) = settings.cache_root() {
        assert!(root.ends_with(CACHE_DIR_NAME));
    }
}
