//! `bcf` is the support layer of a firmware flashing tool. It takes care of the
//! two things that happen before anything is flashed:
//!
//! * picking the serial device the board is connected to, either given
//!   explicitly or chosen interactively out of the connected devices, and
//! * getting the firmware image on the local disk, downloading it once and
//!   reusing the cached copy afterwards.
//!
//! The device side is made of the [`DeviceCatalog`], which lists the connected
//! serial devices sorted by path, and the [`DeviceSelector`], which resolves
//! what the user typed (a path or an index into that list) to a device path.
//!
//! The firmware side is made of the [`FirmwareCache`], keyed by URL, and the
//! [`Downloader`] filling it over HTTP while drawing a [`ProgressBar`].
//! Downloads land in a temporary file first and are renamed into the cache only
//! once complete, so an interrupted transfer never leaves a truncated image
//! behind to be picked up later as a cache hit.
//!
//! Everything is synchronous and blocking. Configuration is passed explicitly
//! through [`Settings`], built with the [`SettingsBuilder`].

mod devices;
mod error;
mod firmware;
mod settings;
mod utils;

pub use devices::{
    match_selection, Device, DeviceCatalog, DeviceList, DeviceSelector, Enumerator, Prompt,
    SystemEnumerator, TermPrompt, PROMPT,
};
pub use error::{Error, Result};
pub use firmware::{
    cache_key, Checksum, Downloader, Fetch, FirmwareCache, CHUNK_SIZE, TRUSTED_PREFIX,
};
pub use settings::{Settings, SettingsBuilder, CACHE_DIR_NAME, DEFAULT_BAR_WIDTH};
pub use utils::{format_table, print_table, render_line, Progress, ProgressBar};
