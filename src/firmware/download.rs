//! Streaming HTTP download of firmware images.

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use console::Term;
use indicatif::{ProgressBar as Spinner, ProgressStyle};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::checksum::Checksum;
use crate::error::{Error, Result};
use crate::utils::{Progress, ProgressBar};

/// Size of the chunks the response body is read in.
pub const CHUNK_SIZE: usize = 4096;

const PROGRESS_TITLE: &str = "Download";

//==============================================================================
// Public Interface
//==============================================================================

/// Populates a file from a URL.
pub trait Fetch {
    /// Download `url` to `destination`. The destination is either written
    /// completely or left untouched. When `expected` is given, content with
    /// another digest is rejected.
    fn fetch(&self, url: &str, destination: &Path, expected: Option<&Checksum>) -> Result<()>;
}

/// Blocking HTTP downloader drawing a progress bar on `stdout`.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    bar_width: usize,
}

impl Downloader {
    /// Creates a downloader following redirects, with the default timeouts
    /// of the HTTP client.
    pub fn new(bar_width: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client, bar_width })
    }

    /// Like [`Fetch::fetch`] but reporting progress to `progress`.
    ///
    /// Progress is only reported when the server announces the length of the
    /// body. Without it, the body is read in one go.
    pub fn fetch_with<P: Progress>(
        &self,
        url: &str,
        destination: &Path,
        expected: Option<&Checksum>,
        progress: &mut P,
    ) -> Result<()> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut response = self.request(url)?;

        // Written next to the destination so that the final rename does not
        // cross file systems. The file is removed if dropped before `persist`.
        let mut file = tempfile::Builder::new()
            .prefix(".bcf-")
            .tempfile_in(dir)
            .map_err(|e| Error::io(dir, e))?;
        let mut hasher = Sha256::new();

        match response.content_length() {
            Some(total) => {
                debug!("{} bytes to download", total);
                let received = copy_chunks(&mut response, &mut file, &mut hasher, total, progress)
                    .map_err(|e| classify(url, file.path(), e))
                    .and_then(|transferred| check_length(url, transferred, total));
                if received.is_err() {
                    progress.abort();
                }
                received?;
            }
            None => {
                debug!("no content length, reading the whole body");
                let body = response.bytes().map_err(|source| Error::Download {
                    url: url.into(),
                    source,
                })?;
                hasher.update(&body);
                file.write_all(&body)
                    .map_err(|e| Error::io(file.path(), e))?;
            }
        }

        let actual = Checksum::from_hasher(hasher);
        if let Some(expected) = expected {
            if *expected != actual {
                return Err(Error::ChecksumMismatch {
                    expected: expected.to_hex(),
                    actual: actual.to_hex(),
                });
            }
        }

        persist(file, destination)?;
        info!("downloaded {} (sha256 {})", url, actual);
        Ok(())
    }

    fn request(&self, url: &str) -> Result<Response> {
        let spinner = Spinner::new_spinner();
        spinner.enable_steady_tick(120);
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
                .template("{spinner:.blue} {msg}"),
        );
        spinner.set_message("Connecting...");

        let result = self
            .client
            .get(url)
            .send()
            .and_then(Response::error_for_status);
        spinner.finish_and_clear();

        let response = result.map_err(|source| Error::Download {
            url: url.into(),
            source,
        })?;
        debug!("{} answered {}", response.url(), response.status());
        Ok(response)
    }
}

impl Fetch for Downloader {
    fn fetch(&self, url: &str, destination: &Path, expected: Option<&Checksum>) -> Result<()> {
        let term = Term::stderr();
        let announced = term
            .write_line(&format!("Download firmware from {}", url))
            .and_then(|_| term.write_line(&format!("Save as {}", destination.display())));
        if let Err(e) = announced {
            debug!("could not write to the terminal: {}", e);
        }

        let mut bar = ProgressBar::stdout(PROGRESS_TITLE).width(self.bar_width);
        self.fetch_with(url, destination, expected, &mut bar)
    }
}

//==============================================================================
// Private stuff
//==============================================================================

/// Which side of the copy failed.
#[derive(Debug)]
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

fn copy_chunks<P: Progress>(
    body: &mut impl Read,
    out: &mut impl Write,
    hasher: &mut Sha256,
    total: u64,
    progress: &mut P,
) -> std::result::Result<u64, CopyError> {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut transferred: u64 = 0;
    loop {
        let n = match body.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        out.write_all(&chunk[..n]).map_err(CopyError::Write)?;
        hasher.update(&chunk[..n]);
        transferred += n as u64;
        progress.update(transferred, total);
    }
    Ok(transferred)
}

fn classify(url: &str, path: &Path, err: CopyError) -> Error {
    match err {
        CopyError::Read(source) => Error::Transfer {
            url: url.into(),
            source,
        },
        CopyError::Write(source) => Error::io(path, source),
    }
}

fn check_length(url: &str, transferred: u64, total: u64) -> Result<()> {
    if transferred < total {
        return Err(Error::Transfer {
            url: url.into(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("got {} of {} bytes", transferred, total),
            ),
        });
    }
    Ok(())
}

fn persist(file: NamedTempFile, destination: &Path) -> Result<()> {
    file.as_file()
        .sync_all()
        .map_err(|e| Error::io(destination, e))?;
    file.persist(destination)
        .map_err(|e| Error::io(destination, e.error))?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
