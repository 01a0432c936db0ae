use hotfolder::{Stage, WatchConfig, Watcher};
use hotfolder_printer::{
    Dispatcher, PrintDispatcher, PrintMethod, PrintResult, PrinterHandle,
};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Default)]
struct CountingDispatcher {
    calls: RefCell<Vec<PathBuf>>,
}

impl Dispatcher for CountingDispatcher {
    async fn dispatch(&self, file: &Path) -> PrintResult<()> {
        self.calls.borrow_mut().push(file.to_path_buf());
        Ok(())
    }
}

fn scenario_config(dir: &Path) -> WatchConfig {
    let raw = serde_json::json!({
        "watch_folder": dir,
        "check_interval_seconds": 1,
        "print_delay_seconds": 0,
        "move_delete_delay_seconds": 0,
        "move_after_print": true,
    });
    let config = WatchConfig::from_json(&raw.to_string()).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_static_file_is_printed_and_moved_within_stability_window() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("statement.pdf");
    let content: Vec<u8> = (0..10 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&file, &content).unwrap();

    let config = scenario_config(dir.path());
    let checks = config.stability_checks as u64;
    let mut watcher = Watcher::new(config, CountingDispatcher::default());
    let start = Instant::now();

    for secs in 0..=checks {
        watcher.tick(start + Duration::from_secs(secs)).await;
    }

    assert_eq!(watcher.stage(&file), Some(Stage::Completed));
    assert_eq!(watcher.dispatcher().calls.borrow().len(), 1);
    let moved = dir.path().join("printed").join("statement.pdf");
    assert_eq!(std::fs::read(moved).unwrap(), content);
    assert!(!file.exists());
}

#[tokio::test]
async fn test_missing_viewer_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("order.pdf");
    std::fs::write(&file, b"%PDF-1.7 order").unwrap();

    let mut config = scenario_config(dir.path());
    config.print_method = PrintMethod::Acrobat;
    config.acrobat_path = dir.path().join("no-such-viewer.exe").display().to_string();

    let dispatcher = PrintDispatcher::new(
        config.print_method,
        PrinterHandle::named("Office"),
        config.viewer_options(),
    );
    let mut watcher = Watcher::new(config, dispatcher);
    let start = Instant::now();

    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    for secs in 0..6 {
        watcher.tick(start + Duration::from_secs(secs)).await;
    }

    let output = logs.contents();
    let failures: Vec<_> = output
        .lines()
        .filter(|line| line.contains("Failed to print"))
        .collect();
    assert_eq!(failures.len(), 1, "log output:\n{}", output);
    assert!(failures[0].contains("ERROR"));
    assert!(failures[0].contains("order.pdf"));

    assert_eq!(watcher.stage(&file), Some(Stage::Failed));
    assert_eq!(std::fs::read(&file).unwrap(), b"%PDF-1.7 order");
    assert!(!dir.path().join("printed").exists());
}
