//! Artifact download.
//!
//! [`Fetcher`] is the seam the download phase goes through, so tests can
//! count or fail fetches without a network. [`HttpFetcher`] streams the
//! response body into `<dest>.part` and renames it onto `dest` only once the
//! whole body has been written; an existing `dest` is therefore always a
//! complete download.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Trait for artifact downloads - allows mocking in tests
pub trait Fetcher: Send + Sync {
    /// Downloads `url` to `dest`, creating parent directories as needed.
    fn fetch(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// Blocking HTTP(S) fetcher with a per-download timeout and progress bars.
pub struct HttpFetcher {
    timeout: Duration,
    progress: MultiProgress,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            progress: MultiProgress::new(),
        }
    }

    fn progress_bar(&self, url: &Url, length: Option<u64>) -> ProgressBar {
        let bar = match length {
            Some(length) => ProgressBar::new(length),
            None => ProgressBar::new_spinner(),
        };
        let style = ProgressStyle::with_template(
            "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or(url.as_str())
            .to_string();
        self.progress.add(bar.with_style(style).with_message(name))
    }
}

fn network_error(url: &Url, err: impl ToString) -> Error {
    Error::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Path of the staging file a download is written to.
pub fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Writer that remembers whether one of its own writes failed, so a copy
/// error can be blamed on the right side.
struct TrackedWriter<W> {
    inner: W,
    failed: bool,
}

impl<W: Write> Write for TrackedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).inspect_err(|_| self.failed = true)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().inspect_err(|_| self.failed = true)
    }
}

/// Streams `reader` into `writer` and flushes it.
///
/// Read failures are network errors for `url`; write failures are
/// filesystem errors naming `staging`.
fn copy_body<R: Read, W: Write>(url: &Url, staging: &Path, reader: &mut R, writer: W) -> Result<u64> {
    let mut writer = TrackedWriter {
        inner: writer,
        failed: false,
    };
    match io::copy(reader, &mut writer) {
        Ok(bytes) => {
            writer
                .flush()
                .map_err(|e| Error::filesystem(staging, e))?;
            Ok(bytes)
        }
        Err(e) if writer.failed => Err(Error::filesystem(staging, e)),
        Err(e) => Err(network_error(url, e)),
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| network_error(url, e))?;
        let response = client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| network_error(url, e))?;

        let bar = self.progress_bar(url, response.content_length());
        let staging = staging_path(dest);
        let file = File::create(&staging).map_err(|e| Error::filesystem(&staging, e))?;
        let mut reader = bar.wrap_read(response);

        let copied = copy_body(url, &staging, &mut reader, BufWriter::new(file));
        bar.finish_and_clear();
        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                // A half-written staging file is never mistaken for a download.
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
        };

        fs::rename(&staging, dest).map_err(|e| Error::filesystem(dest, e))?;
        debug!("Downloaded {} bytes from {}", bytes, url);
        Ok(())
    }
}
