//! Firmware downloads against a local HTTP server.

use std::{
    fs,
    io::{Read, Write},
    net::TcpListener,
    path::Path,
    thread,
};

use bcf::{cache_key, Checksum, Downloader, Error, FirmwareCache, Progress};

const FIRMWARE: &[u8] = b"\x7fFIRMWARE image, pretend this is a binary for a flashable board";

#[derive(Default)]
struct Recorded {
    updates: Vec<(u64, u64)>,
    aborted: bool,
}

impl Progress for Recorded {
    fn update(&mut self, transferred: u64, total: u64) {
        self.updates.push((transferred, total));
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

fn downloader() -> Downloader {
    Downloader::new(20).unwrap()
}

fn leftovers(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn body_with_length_is_streamed_with_progress() {
    let mut server = mockito::Server::new();
    let body = vec![0xA5u8; 10_000];
    let mock = server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_body(&body)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let mut progress = Recorded::default();
    downloader()
        .fetch_with(
            &format!("{}/fw.bin", server.url()),
            &destination,
            None,
            &mut progress,
        )
        .unwrap();

    mock.assert();
    assert_eq!(fs::read(&destination).unwrap(), body);
    let last = *progress.updates.last().unwrap();
    assert_eq!(last, (10_000, 10_000));
    assert!(progress.updates.iter().all(|&(_, total)| total == 10_000));
    assert!(progress.updates.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(leftovers(dir.path()), vec!["fw.bin"]);
}

#[test]
fn body_without_length_is_written_without_progress() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_chunked_body(|w| w.write_all(FIRMWARE))
        .create();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let mut progress = Recorded::default();
    downloader()
        .fetch_with(
            &format!("{}/fw.bin", server.url()),
            &destination,
            None,
            &mut progress,
        )
        .unwrap();

    mock.assert();
    assert_eq!(fs::read(&destination).unwrap(), FIRMWARE);
    assert!(progress.updates.is_empty());
}

#[test]
fn redirects_are_followed() {
    let mut server = mockito::Server::new();
    let url = server.url();
    let moved = server
        .mock("GET", "/latest")
        .with_status(302)
        .with_header("location", &format!("{}/v1.2.0/fw.bin", url))
        .create();
    let actual = server
        .mock("GET", "/v1.2.0/fw.bin")
        .with_status(200)
        .with_body(FIRMWARE)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    downloader()
        .fetch_with(
            &format!("{}/latest", url),
            &destination,
            None,
            &mut Recorded::default(),
        )
        .unwrap();

    moved.assert();
    actual.assert();
    assert_eq!(fs::read(&destination).unwrap(), FIRMWARE);
}

#[test]
fn http_error_leaves_nothing_behind() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/fw.bin").with_status(404).create();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let err = downloader()
        .fetch_with(
            &format!("{}/fw.bin", server.url()),
            &destination,
            None,
            &mut Recorded::default(),
        )
        .unwrap_err();

    mock.assert();
    assert!(err.is_download(), "{:?}", err);
    assert!(matches!(err, Error::Download { .. }));
    assert!(err
        .download_problem()
        .unwrap()
        .starts_with("Firmware download problem: HTTP status client error (404 Not Found)"));
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn truncated_body_is_a_transfer_error() {
    // Announces 100 bytes, sends 10 and hangs up.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut byte = [0u8; 1];
        while !request.ends_with(b"\r\n\r\n") {
            if stream.read(&mut byte).unwrap() == 0 {
                break;
            }
            request.push(byte[0]);
        }
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n")
            .unwrap();
        stream.write_all(&FIRMWARE[..10]).unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let mut progress = Recorded::default();
    let err = downloader()
        .fetch_with(
            &format!("http://127.0.0.1:{}/fw.bin", port),
            &destination,
            None,
            &mut progress,
        )
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, Error::Transfer { .. }), "{:?}", err);
    assert!(err.is_download());
    assert!(err
        .download_problem()
        .unwrap()
        .starts_with("Firmware download problem: transfer of http://127.0.0.1:"));
    assert!(progress.aborted);
    assert!(!destination.exists());
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn unreachable_server_is_a_download_error() {
    // Grab a free port and close it again, nothing listens there anymore.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let err = downloader()
        .fetch_with(
            &format!("http://127.0.0.1:{}/fw.bin", port),
            &destination,
            None,
            &mut Recorded::default(),
        )
        .unwrap_err();

    assert!(err.is_download(), "{:?}", err);
    assert!(!destination.exists());
}

#[test]
fn checksum_mismatch_is_not_committed() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_body(FIRMWARE)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("fw.bin");
    let expected = Checksum::of(b"some other firmware");
    let err = downloader()
        .fetch_with(
            &format!("{}/fw.bin", server.url()),
            &destination,
            Some(&expected),
            &mut Recorded::default(),
        )
        .unwrap_err();

    match err {
        Error::ChecksumMismatch { expected: e, actual } => {
            assert_eq!(e, expected.to_hex());
            assert_eq!(actual, Checksum::of(FIRMWARE).to_hex());
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn cached_firmware_is_fetched_once() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_body(FIRMWARE)
        .expect(1)
        .create();
    let url = format!("{}/fw.bin", server.url());

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("bcf");
    let cache = FirmwareCache::new(&root, downloader());

    let first = cache.resolve(&url, true).unwrap();
    let second = cache.resolve(&url, true).unwrap();

    mock.assert();
    assert_eq!(first, second);
    assert_eq!(first, root.join(cache_key(&url)));
    assert_eq!(fs::read(&first).unwrap(), FIRMWARE);
}

#[test]
fn disabled_cache_downloads_again() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_body(FIRMWARE)
        .expect(2)
        .create();
    let url = format!("{}/fw.bin", server.url());

    let dir = tempfile::tempdir().unwrap();
    let cache = FirmwareCache::new(dir.path(), downloader());
    cache.resolve(&url, false).unwrap();
    cache.resolve(&url, false).unwrap();

    mock.assert();
}

#[test]
fn verified_cache_replaces_corrupt_entry() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/fw.bin")
        .with_status(200)
        .with_body(FIRMWARE)
        .expect(1)
        .create();
    let url = format!("{}/fw.bin", server.url());

    let dir = tempfile::tempdir().unwrap();
    let cache =
        FirmwareCache::new(dir.path(), downloader()).checksum(Some(Checksum::of(FIRMWARE)));
    fs::write(cache.path_for(&url), &FIRMWARE[..10]).unwrap();

    let path = cache.resolve(&url, true).unwrap();
    cache.resolve(&url, true).unwrap();

    mock.assert();
    assert_eq!(fs::read(path).unwrap(), FIRMWARE);
}
