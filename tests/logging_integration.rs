use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use media_relocate::platform::open_log_file_secure_append;
use media_relocate::{JsonHistoryLog, JsonMetadataStore, LocalFs, Relocator, RelocatorOptions, Tree};
use tempfile::tempdir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tsfmt, registry};

/// Appends everything written into a shared Vec<u8>.
#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture(level: &str, f: impl FnOnce()) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer()
        .with_writer(make_writer)
        .with_target(false)
        .with_ansi(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new(level)).with(layer);
    let dispatch = tracing::Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, f);
    let guard = buf.lock().unwrap();
    String::from_utf8_lossy(&guard[..]).to_string()
}

fn relocator(root: &std::path::Path, logging: bool) -> Relocator<JsonMetadataStore, JsonHistoryLog, LocalFs> {
    Relocator::new(
        Tree::new(root, "http://m/uploads"),
        JsonMetadataStore::in_memory(),
        JsonHistoryLog::in_memory(),
        LocalFs,
        RelocatorOptions { logging, batch_size: 10 },
    )
}

#[test]
fn relocation_emits_structured_events() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("a.jpg"), "x").unwrap();
    let mut r = relocator(td.path(), false);

    let contents = capture("info", || {
        assert!(r.rename("a.jpg", "b.jpg").unwrap().success);
    });
    assert!(contents.contains("Relocating"), "contents={contents}");
    assert!(contents.contains("Relocation completed"), "contents={contents}");
    assert!(contents.contains("history_id"), "contents={contents}");
    assert!(!contents.contains("Item operation log"));
}

#[test]
fn item_operation_log_is_dumped_when_enabled() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("a.jpg"), "x").unwrap();
    fs::write(td.path().join("b.jpg"), "y").unwrap();
    let mut r = relocator(td.path(), true);

    let contents = capture("debug", || {
        assert!(!r.rename("a.jpg", "b.jpg").unwrap().success);
    });
    assert!(contents.contains("Item operation log"), "contents={contents}");
    assert!(contents.contains("already exists"), "contents={contents}");
    assert!(contents.contains("Relocation rolled back"), "contents={contents}");
}

#[test]
fn file_logging_writes_to_custom_path() {
    let td = tempdir().expect("tempdir");
    let log_path: PathBuf = td.path().join("media_relocate_test.log");

    // Production refuses file logging below a symlinked ancestor (macOS temp dirs).
    if media_relocate::path_has_symlink_ancestor(&log_path).unwrap() {
        eprintln!("Skipping file logging test: path has symlink ancestor: {}", log_path.display());
        return;
    }

    let file = open_log_file_secure_append(&log_path).expect("open_log_file_secure_append");
    let (writer, guard): (tracing_appender::non_blocking::NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(file);
    let file_layer = tsfmt::layer()
        .with_writer(move || writer.clone())
        .with_target(false)
        .with_ansi(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new("info")).with(file_layer);
    let dispatch = tracing::Dispatch::new(subscriber);

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!("file-logging-test: written");
    });
    drop(guard);

    let contents = fs::read_to_string(&log_path).expect("read log file");
    assert!(contents.contains("file-logging-test"), "contents={contents}");
}
