//! Serial device enumeration and interactive selection.
//!
//! The [`DeviceCatalog`] lists the serial devices currently connected, sorted
//! by path, and the [`DeviceSelector`] turns what the user gave on the command
//! line (or typed at the prompt) into a device path.
//!
//! ```no_run
//! use bcf::{DeviceCatalog, DeviceSelector, TermPrompt};
//!
//! let catalog = DeviceCatalog::system();
//! let mut selector = DeviceSelector::new(&catalog, TermPrompt::default());
//! let path = selector.resolve(None)?;
//! println!("{}", path);
//! # Ok::<(), bcf::Error>(())
//! ```

mod catalog;
mod selector;

pub use catalog::{Device, DeviceCatalog, DeviceList, Enumerator, SystemEnumerator};
pub use selector::{match_selection, DeviceSelector, Prompt, TermPrompt, PROMPT};
