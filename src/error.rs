//! Error types shared by the device and firmware helpers.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while picking a device or fetching firmware.
#[derive(Error, Debug)]
pub enum Error {
    /// The operating system query listing serial devices failed.
    #[error("serial device enumeration failed: {0}")]
    Enumeration(#[from] serialport::Error),

    #[error("No device")]
    NoDevice,

    /// The user typed something that is neither a listed path nor an index.
    #[error("Unknown device `{0}`")]
    UnknownDevice(String),

    #[error("could not read the device selection: {0}")]
    Prompt(#[source] std::io::Error),

    /// Transport failure (connection, timeout, non-success status, truncated
    /// body) while downloading firmware.
    #[error("{source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The connection dropped or the body was shorter than announced.
    #[error("transfer of {url} interrupted: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not set up the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("`{0}` is not a hex encoded SHA-256 digest")]
    InvalidChecksum(String),

    #[error("no cache directory could be determined for this user")]
    NoCacheDir,
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for failures of the firmware transfer itself, which the command
    /// line treats as fatal before anything gets flashed.
    pub fn is_download(&self) -> bool {
        matches!(self, Error::Download { .. } | Error::Transfer { .. })
    }

    /// The line the command line prints before giving up on a download.
    pub fn download_problem(&self) -> Option<String> {
        if self.is_download() {
            Some(format!("Firmware download problem: {}", self))
        } else {
            None
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn unknown_device_message_names_input() {
    let err = Error::UnknownDevice("/dev/z".into());
    assert_eq!(err.to_string(), "Unknown device `/dev/z`");
    assert!(!err.is_download());
}

#[test]
fn io_error_names_path() {
    let err = Error::io(
        "/tmp/bcf/x.bin",
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    );
    assert_eq!(err.to_string(), "I/O error on /tmp/bcf/x.bin: denied");
}

#[test]
fn transfer_problem_names_url_and_cause() {
    let err = Error::Transfer {
        url: "https://example.com/fw.bin".into(),
        source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "got 10 of 100 bytes"),
    };
    assert_eq!(
        err.download_problem().unwrap(),
        "Firmware download problem: transfer of https://example.com/fw.bin \
         interrupted: got 10 of 100 bytes"
    );
}

#[test]
fn download_problem_shows_the_client_error() {
    let source = reqwest::blocking::Client::new()
        .get("not a url")
        .send()
        .unwrap_err();
    let cause = source.to_string();
    let err = Error::Download {
        url: "not a url".into(),
        source,
    };
    assert!(!cause.is_empty());
    assert_eq!(err.to_string(), cause);
    assert_eq!(
        err.download_problem().unwrap(),
        format!("Firmware download problem: {}", cause)
    );
}

#[test]
fn other_errors_are_not_download_problems() {
    assert_eq!(Error::NoDevice.download_problem(), None);
}
