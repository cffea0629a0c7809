//! Local cache of fixture media files.
//!
//! Assets are keyed by the fixture's `file` name inside a single download
//! directory. A file that already exists is trusted as-is; there is no size
//! or checksum verification against the source.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::FixtureDefinition;
use crate::error::AssetError;

/// Network transport used to populate the cache on a miss.
pub trait AssetFetcher {
    /// Fetch `url` and write the full body to `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> io::Result<()>;
}

/// Blocking HTTP(S) fetcher backed by `ureq`.
///
/// Only the connect phase is bounded; the body transfer has no timeout and
/// nothing is retried.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> io::Result<()> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => io::Error::other(format!("HTTP status {code}")),
            ureq::Error::Transport(transport) => io::Error::other(transport.to_string()),
        })?;

        let mut reader = response.into_reader();
        let mut file = File::create(dest)?;
        io::copy(&mut reader, &mut file)?;
        file.flush()?;
        Ok(())
    }
}

/// Filename-keyed asset cache rooted at a download directory.
pub struct AssetCache {
    dir: PathBuf,
    fetcher: Box<dyn AssetFetcher>,
}

impl AssetCache {
    pub fn new<P: Into<PathBuf>>(dir: P, fetcher: Box<dyn AssetFetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
        }
    }

    /// Path the fixture's media occupies inside the cache.
    pub fn path_for(&self, fixture: &FixtureDefinition) -> PathBuf {
        self.dir.join(&fixture.file)
    }

    /// Make sure the fixture's media exists locally and return its path.
    pub fn ensure(&self, fixture: &FixtureDefinition) -> Result<PathBuf, AssetError> {
        fs::create_dir_all(&self.dir).map_err(|err| AssetError::CacheDir {
            path: self.dir.clone(),
            reason: err.to_string(),
        })?;

        let target = self.path_for(fixture);
        if target.exists() {
            log::debug!("[AssetCache] Cache hit for {} at {}", fixture.id, target.display());
            return Ok(target);
        }

        log::info!("[AssetCache] Downloading {} from {}...", fixture.id, fixture.url);
        let partial = self.dir.join(format!("{}.part", fixture.file));
        if let Err(err) = self.fetcher.fetch(&fixture.url, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(AssetError::Download {
                id: fixture.id.clone(),
                url: fixture.url.clone(),
                reason: err.to_string(),
            });
        }

        fs::rename(&partial, &target).map_err(|err| AssetError::Storage {
            path: target.clone(),
            reason: err.to_string(),
        })?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingFetcher {
        calls: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl AssetFetcher for RecordingFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> io::Result<()> {
            self.calls.borrow_mut().push(url.to_string());
            if self.fail {
                fs::write(dest, b"partial")?;
                return Err(io::Error::other("connection reset"));
            }
            fs::write(dest, format!("media from {url}"))
        }
    }

    fn fixture(id: &str) -> FixtureDefinition {
        FixtureDefinition {
            id: id.to_string(),
            file: format!("{id}.mp4"),
            url: format!("http://x/{id}.mp4"),
            codec: Some("h264".to_string()),
            container: Some("mp4".to_string()),
            frames: 60,
            suite: "smoke".to_string(),
        }
    }

    #[test]
    fn miss_downloads_then_hits_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::default();
        let calls = fetcher.calls.clone();
        let cache = AssetCache::new(dir.path().join("downloads"), Box::new(fetcher));

        let first = cache.ensure(&fixture("a")).unwrap();
        let second = cache.ensure(&fixture("a")).unwrap();
        let third = cache.ensure(&fixture("a")).unwrap();

        assert_eq!(first, dir.path().join("downloads").join("a.mp4"));
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(calls.borrow().as_slice(), ["http://x/a.mp4"]);
        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            "media from http://x/a.mp4"
        );
    }

    #[test]
    fn existing_file_is_never_fetched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"seeded").unwrap();
        let fetcher = RecordingFetcher::default();
        let calls = fetcher.calls.clone();
        let cache = AssetCache::new(dir.path(), Box::new(fetcher));

        let path = cache.ensure(&fixture("a")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"seeded");
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn failed_fetch_is_download_error_and_leaves_no_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher {
            fail: true,
            ..Default::default()
        };
        let cache = AssetCache::new(dir.path(), Box::new(fetcher));

        match cache.ensure(&fixture("b")).unwrap_err() {
            AssetError::Download { id, url, reason } => {
                assert_eq!(id, "b");
                assert_eq!(url, "http://x/b.mp4");
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.path().join("b.mp4").exists());
        assert!(!dir.path().join("b.mp4.part").exists());
    }

    /// Serve `requests` connections on loopback: `/a.mp4` gets a body, every
    /// other path a 404.
    fn serve(requests: usize) -> (String, std::thread::JoinHandle<()>) {
        use std::io::{BufRead, BufReader};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("");
                let (status, body) = if path == "/a.mp4" {
                    ("200 OK", "served media")
                } else {
                    ("404 Not Found", "")
                };
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });
        (base, handle)
    }

    #[test]
    fn http_fetcher_populates_cache_and_maps_status_errors() {
        let (base, server) = serve(2);
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(dir.path(), Box::new(HttpFetcher::new()));

        let mut ok = fixture("a");
        ok.url = format!("{base}/a.mp4");
        let path = cache.ensure(&ok).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "served media");

        let mut missing = fixture("b");
        missing.url = format!("{base}/b.mp4");
        match cache.ensure(&missing).unwrap_err() {
            AssetError::Download { id, reason, .. } => {
                assert_eq!(id, "b");
                assert!(reason.contains("404"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.path().join("b.mp4").exists());
        assert!(!dir.path().join("b.mp4.part").exists());

        server.join().unwrap();
    }
}
