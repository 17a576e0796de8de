//! Resolution of the device to use, asking the user when needed.

use std::io;

use console::Term;
use dialoguer::Input;
use log::{debug, info};

use super::catalog::{Device, DeviceCatalog, Enumerator};
use crate::error::{Error, Result};

/// Text of the interactive device prompt.
pub const PROMPT: &str = "Please enter device";

//==============================================================================
// Public Interface
//==============================================================================

/// The interactive side of device selection.
///
/// Everything goes to the diagnostic stream so that the selected path can be
/// piped from the primary output.
pub trait Prompt {
    /// Show one informational line to the user.
    fn show(&mut self, line: &str) -> io::Result<()>;

    /// Ask the user for free text and block until it is entered.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;
}

/// [`Prompt`] on the `stderr` terminal.
#[derive(Debug)]
pub struct TermPrompt {
    term: Term,
}

impl Default for TermPrompt {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Prompt for TermPrompt {
    fn show(&mut self, line: &str) -> io::Result<()> {
        self.term.write_line(line)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text_on(&self.term)
    }
}

/// Turns an optional device identifier into a device path.
pub struct DeviceSelector<'a, E: Enumerator, P: Prompt> {
    catalog: &'a DeviceCatalog<E>,
    prompt: P,
    include_aliases: bool,
}

impl<'a, E: Enumerator, P: Prompt> DeviceSelector<'a, E, P> {
    pub fn new(catalog: &'a DeviceCatalog<E>, prompt: P) -> Self {
        Self {
            catalog,
            prompt,
            include_aliases: false,
        }
    }

    /// Offer the symlinked aliases of devices as well.
    pub fn include_aliases(mut self, include_aliases: bool) -> Self {
        self.include_aliases = include_aliases;
        self
    }

    /// Returns the device path to use.
    ///
    /// An explicit device is returned as is, without checking that it exists:
    /// it may not have shown up yet. Otherwise the connected devices are listed
    /// with their index and the user picks one by typing its path or index.
    pub fn resolve(&mut self, explicit: Option<&str>) -> Result<String> {
        if let Some(path) = explicit {
            debug!("using device `{}` given by the caller", path);
            return Ok(path.to_owned());
        }

        let devices = self.catalog.list_devices(self.include_aliases)?;
        if devices.is_empty() {
            return Err(Error::NoDevice);
        }

        for (index, device) in devices.iter().enumerate() {
            self.prompt
                .show(&format!("{} {}", index, device.path))
                .map_err(Error::Prompt)?;
        }
        let answer = self.prompt.ask(PROMPT).map_err(Error::Prompt)?;

        let path = match_selection(&devices, &answer)?;
        info!("selected device {}", path);
        Ok(path)
    }
}

/// Matches what the user typed against `devices`, first as a literal path and
/// then as an index into the list.
pub fn match_selection(devices: &[Device], input: &str) -> Result<String> {
    let input = input.trim();
    if let Some(device) = devices.iter().find(|d| d.path == input) {
        return Ok(device.path.clone());
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|index| devices.get(index))
        .map(|device| device.path.clone())
        .ok_or_else(|| Error::UnknownDevice(input.to_owned()))
}

// =============================================================================
// Unit Tests
// =============================================================================
