//! SHA-256 digests of firmware images.

use std::{
    fmt,
    fs::File,
    io::{self, Read},
    path::Path,
    str::FromStr,
};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A SHA-256 digest.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Digest of `data`.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self::from_hasher(Sha256::new().chain(data))
    }

    /// Digest of the content of the file at `path`, read in a streaming way.
    pub fn of_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(path, e)),
            };
            hasher.update(&buffer[..n]);
        }
        Ok(Self::from_hasher(hasher))
    }

    pub(crate) fn from_hasher(hasher: Sha256) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Checksum(digest)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| Error::InvalidChecksum(s.into()))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidChecksum(s.into()));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes);
        Ok(Checksum(digest))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn known_digest() {
    assert_eq!(
        Checksum::of("abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn parses_upper_and_lower_case_hex() {
    let lower: Checksum = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        .parse()
        .unwrap();
    let upper: Checksum = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        .parse()
        .unwrap();
    assert_eq!(lower, upper);
    assert_eq!(lower, Checksum::of("abc"));
}

#[test]
fn rejects_bad_digests() {
    assert!(matches!(
        "abcd".parse::<Checksum>(),
        Err(Error::InvalidChecksum(_))
    ));
    assert!(matches!(
        "not hex at all".parse::<Checksum>(),
        Err(Error::InvalidChecksum(_))
    ));
}

#[test]
fn file_digest_matches_content_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fw.bin");
    std::fs::write(&path, b"firmware image").unwrap();
    assert_eq!(
        Checksum::of_file(&path).unwrap(),
        Checksum::of(b"firmware image")
    );
}
