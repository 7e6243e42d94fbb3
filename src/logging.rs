use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log files are cut back to their newest half once they reach this size.
const MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// `trace`, `debug`, `info`, `warn` or `error`; anything else means `info`.
pub fn parse_level(level: &str) -> Level {
    Level::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", level);
        Level::INFO
    })
}

pub fn init_logging(log_level: Level, log_file: Option<&Path>) {
    let level_filter = LevelFilter::from_level(log_level);
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout);

    match log_file {
        Some(path) => {
            let capped = CappedFile::new(path.to_path_buf(), MAX_LOG_FILE_BYTES);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || capped.clone());
            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(level_filter))
                .with(file_layer.with_filter(level_filter))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(level_filter))
                .init();
        }
    }
}

/// Append-only log file with a size cap. Clones share one lock so concurrent
/// writers never interleave a trim with an append.
#[derive(Debug, Clone)]
struct CappedFile {
    path: Arc<PathBuf>,
    max_len: u64,
    lock: Arc<Mutex<()>>,
}

impl CappedFile {
    fn new(path: PathBuf, max_len: u64) -> Self {
        Self {
            path: Arc::new(path),
            max_len,
            lock: Arc::new(Mutex::new(())),
        }
    }
}

impl Write for CappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let len = std::fs::metadata(self.path.as_path()).map(|m| m.len()).unwrap_or(0);
        if len >= self.max_len {
            keep_tail(&self.path, self.max_len / 2)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Rewrites `path` so only its last `keep_bytes` bytes remain.
fn keep_tail(path: &Path, keep_bytes: u64) -> io::Result<()> {
    let mut tail = Vec::new();
    if let Ok(mut rf) = OpenOptions::new().read(true).open(path) {
        let size = rf.metadata()?.len();
        rf.seek(SeekFrom::Start(size.saturating_sub(keep_bytes)))?;
        rf.read_to_end(&mut tail)?;
    }
    let mut wf = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    wf.write_all(&tail)
}
