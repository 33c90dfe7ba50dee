//! Integration tests for the leveled logger
//!
//! These tests verify:
//! - Header layout and cascading into lower severities
//! - Verbosity threshold and per-file overrides
//! - File naming, rotation and the file header on disk
//! - Fatal and exit handling through the exit hook
//! - Sink failure reporting and console fallback

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use parking_lot::Mutex;
use rust_leveled_logger::appenders::MemorySink;
use rust_leveled_logger::core::file_name::FileNaming;
use rust_leveled_logger::core::{
    extract_timestamp, CallSite, Clock, Logger, LoggerConfig, LoggerError, RotationConfig,
    RotationInterval, Severity, Sink,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn start() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2006, 1, 2, 15, 4, 5)
        .single()
        .expect("valid datetime")
        + ChronoDuration::microseconds(67890)
}

/// A clock that tests can move forward.
fn movable_clock() -> (Clock, Arc<Mutex<DateTime<Local>>>) {
    let now = Arc::new(Mutex::new(start()));
    let handle = Arc::clone(&now);
    (Arc::new(move || *handle.lock()), now)
}

fn naming() -> FileNaming {
    FileNaming {
        program: "node".to_string(),
        host: "host".to_string(),
        user: "user".to_string(),
        pid: 42,
    }
}

/// Logger writing into memory sinks, nothing mirrored to the console.
fn memory_logger() -> (Logger, Vec<MemorySink>, MemorySink) {
    let (clock, _) = movable_clock();
    let console = MemorySink::new("console");
    let logger = Logger::builder()
        .clock(clock)
        .pid(1234)
        .colors(false)
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .console(console.clone())
        .exit_hook(Arc::new(|_| {}))
        .build()
        .expect("Failed to build logger");
    let sinks: Vec<MemorySink> = Severity::ALL
        .iter()
        .map(|s| MemorySink::new(s.to_str()))
        .collect();
    logger.swap_sinks_with(|severity| sinks[severity.index()].clone());
    (logger, sinks, console)
}

fn files_in(dir: &Path, needle: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read log dir")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(needle) && !n.ends_with(needle))
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_info_header_layout() {
    let (logger, sinks, _console) = memory_logger();
    logger.info("test");
    let line = line!() - 1;
    assert_eq!(
        sinks[0].contents(),
        format!(
            "I0102 15:04:05.067890    1234 integration_tests.rs:{}] test\n",
            line
        )
    );
}

#[test]
fn test_colored_header() {
    let (logger, sinks, _console) = memory_logger();
    logger.set_colors(true);
    logger.error_at(CallSite::new("tests/x.rs", 3), "red");
    assert_eq!(
        sinks[2].contents(),
        "\x1b[31mE\x1b[0m0102 15:04:05.067890    1234 x.rs:3] red\n"
    );
}

#[test]
fn test_message_newline_not_doubled() {
    let (logger, sinks, _console) = memory_logger();
    logger.info("already terminated\n");
    assert!(sinks[0].contents().ends_with("] already terminated\n"));
    assert_eq!(sinks[0].contents().matches('\n').count(), 1);
}

#[test]
fn test_cascading() {
    let (logger, sinks, _console) = memory_logger();

    logger.info("info");
    assert_eq!(sinks[0].contents().lines().count(), 1);
    assert!(sinks[1].is_empty());

    logger.warning("warning");
    assert!(sinks[1].contents().contains("warning"));
    assert!(sinks[0].contents().contains("warning"));
    assert!(sinks[2].is_empty());

    logger.error("error");
    assert!(sinks[2].contents().contains("error"));
    assert!(sinks[1].contents().contains("error"));
    assert!(sinks[0].contents().contains("error"));
    assert!(sinks[3].is_empty());

    assert_eq!(logger.stats(Severity::Info).lines(), 1);
    assert_eq!(logger.stats(Severity::Warning).lines(), 1);
    assert_eq!(logger.stats(Severity::Error).lines(), 1);
}

#[test]
fn test_depth_attribution_for_wrappers() {
    #[track_caller]
    fn wrapper(logger: &Logger, msg: &str) {
        logger.warning(format!("wrapped: {}", msg));
    }

    fn explicit_wrapper(logger: &Logger, site: CallSite, msg: &str) {
        logger.warning_at(site, msg);
    }

    let (logger, sinks, _console) = memory_logger();
    wrapper(&logger, "a");
    let line = line!() - 1;
    assert!(sinks[1]
        .contents()
        .contains(&format!("integration_tests.rs:{}] wrapped: a", line)));

    sinks[1].clear();
    explicit_wrapper(&logger, CallSite::caller(), "b");
    let line = line!() - 1;
    assert!(sinks[1]
        .contents()
        .contains(&format!("integration_tests.rs:{}] b", line)));
}

#[test]
fn test_verbosity_threshold() {
    let (logger, sinks, _console) = memory_logger();
    logger.set_verbosity(2);
    assert!(logger.v(2).enabled());
    assert!(!logger.v(3).enabled());

    logger.v(2).info("visible");
    logger.v(3).info("hidden");
    let contents = sinks[0].contents();
    assert!(contents.contains("visible"));
    assert!(!contents.contains("hidden"));
}

#[test]
fn test_vmodule_overrides() {
    let (logger, _sinks, _console) = memory_logger();
    logger.set_verbosity(0);

    logger.set_vmodule("integration_tests=2").unwrap();
    assert!(logger.v(1).enabled());
    assert!(logger.v(2).enabled());
    assert!(!logger.v(3).enabled());

    logger.set_vmodule("tests/*=1").unwrap();
    assert!(logger.v(1).enabled());
    assert!(!logger.v(2).enabled());

    logger.set_vmodule("*=3").unwrap();
    assert!(logger.v(3).enabled());

    logger.set_vmodule("other_file=3").unwrap();
    assert!(!logger.v(1).enabled());
}

#[test]
fn test_invalid_vmodule_keeps_active_overrides() {
    let (logger, _sinks, _console) = memory_logger();
    logger.set_vmodule("integration_tests=5").unwrap();

    let err = logger.set_vmodule("a=1,broken").unwrap_err();
    assert!(err.is_config_error());
    let err = logger.set_vmodule("x\\=1").unwrap_err();
    assert!(err.is_config_error());

    assert_eq!(logger.vmodule(), "integration_tests=5");
    assert!(logger.v(5).enabled());
}

#[test]
fn test_fatal_flushes_and_exits() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let status = Arc::new(AtomicI32::new(0));
    let status_clone = Arc::clone(&status);
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .file_naming(naming())
        .stderr_threshold(None)
        .console(MemorySink::new("console"))
        .flush_interval(Duration::ZERO)
        .exit_hook(Arc::new(move |code| status_clone.store(code, Ordering::SeqCst)))
        .build()
        .expect("Failed to build logger");

    logger.info("before");
    logger.fatal("the end");
    assert_eq!(status.load(Ordering::SeqCst), 255);

    // Nothing buffered is left: every file is on disk without an explicit flush.
    for severity in Severity::ALL {
        let files = files_in(temp_dir.path(), &format!(".log.{}.", severity));
        assert_eq!(files.len(), 1, "{} files: {:?}", severity, files);
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("] the end\n"), "{}", content);
        assert!(content.contains("stack trace of thread"), "{}", content);
    }
}

#[test]
fn test_exit_uses_status_one_without_trace() {
    let (logger, sinks, console) = memory_logger();
    let status = Arc::new(AtomicI32::new(0));
    let status_clone = Arc::clone(&status);
    logger.set_exit_hook(Arc::new(move |code| status_clone.store(code, Ordering::SeqCst)));
    logger.set_console_mirror(Severity::Fatal, true);

    logger.exit("shutting down");
    assert_eq!(status.load(Ordering::SeqCst), 1);
    for sink in &sinks {
        assert!(sink.contents().starts_with('F'));
        assert!(!sink.contents().contains("stack trace"));
    }
    assert!(console.contents().contains("shutting down"));
}

#[test]
fn test_trace_location_appends_stack() {
    let (logger, sinks, _console) = memory_logger();
    logger.set_trace_location("integration_tests.rs:1").unwrap();
    logger.info_at(CallSite::new("tests/integration_tests.rs", 1), "traced");
    logger.info_at(CallSite::new("tests/integration_tests.rs", 2), "untraced");

    let contents = sinks[0].contents();
    let traced_at = contents.find("traced").unwrap();
    let stack_at = contents.find("stack trace of thread").unwrap();
    let untraced_at = contents.find("untraced").unwrap();
    assert!(traced_at < stack_at && stack_at < untraced_at);

    logger.set_trace_location("").unwrap();
    assert!(logger.trace_location().is_none());
    assert!(logger.set_trace_location("integration_tests.rs:0").is_err());
    assert!(logger.set_trace_location("integration_tests.rs").is_err());
}

#[test]
fn test_files_are_named_and_cascaded_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (clock, _) = movable_clock();
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .file_naming(naming())
        .clock(clock)
        .colors(false)
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .build()
        .expect("Failed to build logger");

    logger.warning("disk full");
    logger.flush();

    let info = files_in(temp_dir.path(), ".log.INFO.");
    let warning = files_in(temp_dir.path(), ".log.WARNING.");
    assert_eq!(info.len(), 1);
    assert_eq!(warning.len(), 1);
    assert!(files_in(temp_dir.path(), ".log.ERROR.").is_empty());

    let name = warning[0].file_name().unwrap().to_str().unwrap();
    assert_eq!(name, "node.host.user.log.WARNING.20060102-150405.42");
    assert_eq!(extract_timestamp(name, "node.host.user.log."), "20060102-150405");

    let content = fs::read_to_string(&warning[0]).unwrap();
    assert!(content.starts_with("Log file created at: 2006/01/02 15:04:05\n"));
    assert!(content.contains("Binary: node (pid 42)\n"));
    assert!(content.ends_with("] disk full\n"));
}

#[test]
fn test_size_rotation_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (clock, now) = movable_clock();
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .file_naming(naming())
        .clock(clock)
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .rotation(RotationConfig::new().with_max_size(512))
        .build()
        .expect("Failed to build logger");

    logger.info("first");
    *now.lock() = start() + ChronoDuration::seconds(1);
    logger.info("x".repeat(600));
    logger.flush();

    let files = files_in(temp_dir.path(), ".log.INFO.");
    assert_eq!(files.len(), 2, "{:?}", files);
    let old = fs::read_to_string(&files[0]).unwrap();
    let new = fs::read_to_string(&files[1]).unwrap();
    assert!(old.contains("] first\n"));
    assert!(!old.contains("xxxx"));
    assert!(new.contains(&"x".repeat(600)));
}

#[test]
fn test_rollover_waits_for_next_second() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (clock, now) = movable_clock();
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .file_naming(naming())
        .clock(clock)
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .rotation(RotationConfig::new().with_max_size(512))
        .build()
        .expect("Failed to build logger");

    logger.info("x");
    logger.info("y".repeat(1024));
    logger.flush();
    assert_eq!(files_in(temp_dir.path(), ".log.INFO.").len(), 1);

    *now.lock() = start() + ChronoDuration::seconds(1);
    logger.info("z");
    logger.flush();

    let files = files_in(temp_dir.path(), ".log.INFO.");
    assert_eq!(files.len(), 2, "{:?}", files);
    for file in &files {
        let content = fs::read_to_string(file).unwrap();
        assert_eq!(content.matches("Log file created at:").count(), 1);
    }
    let newest = fs::read_to_string(&files[1]).unwrap();
    assert!((newest.len() as u64) < 512, "{}", newest.len());
    assert!(newest.ends_with("] z\n"));
}

#[test]
fn test_interval_rotation_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (clock, now) = movable_clock();
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .file_naming(naming())
        .clock(clock)
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .rotation(
            RotationConfig::new()
                .with_max_size(0)
                .with_interval(RotationInterval::Hourly),
        )
        .build()
        .expect("Failed to build logger");

    logger.info("a");
    *now.lock() = start() + ChronoDuration::minutes(59);
    logger.info("b");
    assert_eq!(files_in(temp_dir.path(), ".log.INFO.").len(), 1);

    *now.lock() = start() + ChronoDuration::minutes(60);
    logger.info("c");
    logger.flush();
    assert_eq!(files_in(temp_dir.path(), ".log.INFO.").len(), 2);
}

#[test]
fn test_rotation_config_can_change_at_runtime() {
    let (logger, _sinks, _console) = memory_logger();
    assert_eq!(logger.rotation(), RotationConfig::default());
    let daily = RotationConfig::new().with_interval(RotationInterval::Daily);
    logger.set_rotation(daily);
    assert_eq!(logger.rotation(), daily);
}

struct BrokenSink;

impl Sink for BrokenSink {
    fn write(&mut self, _bytes: &[u8], _now: DateTime<Local>) -> rust_leveled_logger::Result<()> {
        Err(LoggerError::file_appender("/dev/full", "No space left on device"))
    }

    fn flush(&mut self) -> rust_leveled_logger::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[test]
fn test_sink_failure_reports_and_falls_back_to_console() {
    let (logger, _sinks, console) = memory_logger();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);
    logger.set_error_hook(Arc::new(move |e: &LoggerError| errors_clone.lock().push(e.to_string())));
    logger.swap_sinks_with(|_| BrokenSink);

    logger.error("cannot be stored");
    assert!(console.contents().contains("] cannot be stored\n"));
    assert_eq!(console.contents().lines().count(), 1);
    assert_eq!(errors.lock().len(), 3);
    assert!(errors.lock()[0].contains("No space left on device"));
    assert_eq!(logger.dropped_count(), 0);
}

#[test]
fn test_sink_failure_without_fallback_drops() {
    let console = MemorySink::new("console");
    let config = LoggerConfig {
        console_fallback: false,
        stderr_threshold: None,
        flush_interval_secs: 0,
        ..LoggerConfig::default()
    };
    let logger = Logger::builder()
        .config(config)
        .console(console.clone())
        .error_hook(Arc::new(|_| {}))
        .build()
        .expect("Failed to build logger");
    logger.swap_sinks_with(|_| BrokenSink);

    logger.info("gone");
    assert!(console.is_empty());
    assert_eq!(logger.dropped_count(), 1);
}

#[test]
fn test_unwritable_log_dir_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let console = MemorySink::new("console");
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);
    let logger = Logger::builder()
        .log_dir(blocker.join("logs"))
        .file_naming(naming())
        .stderr_threshold(None)
        .console(console.clone())
        .flush_interval(Duration::ZERO)
        .error_hook(Arc::new(move |e: &LoggerError| errors_clone.lock().push(e.to_string())))
        .build()
        .expect("Failed to build logger");

    logger.info("still visible");
    assert!(console.contents().contains("still visible"));
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].contains("Cannot create log file"));
}

#[test]
fn test_second_log_dir_used_when_first_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let good = temp_dir.path().join("good");

    let logger = Logger::builder()
        .log_dir(blocker.join("logs"))
        .log_dir(&good)
        .file_naming(naming())
        .stderr_threshold(None)
        .flush_interval(Duration::ZERO)
        .error_hook(Arc::new(|e: &LoggerError| panic!("unexpected error: {}", e)))
        .build()
        .expect("Failed to build logger");

    logger.info("in the second directory");
    logger.flush();
    assert_eq!(files_in(&good, ".log.INFO.").len(), 1);
}

#[test]
fn test_console_mirroring_from_config() {
    let console = MemorySink::new("console");
    let logger = Logger::builder()
        .stderr_threshold(Some(Severity::Warning))
        .console(console.clone())
        .flush_interval(Duration::ZERO)
        .build()
        .expect("Failed to build logger");
    logger.swap_sinks_with(|s| MemorySink::new(s.to_str()));

    logger.info("quiet");
    logger.warning("loud");
    let mirrored = console.contents();
    assert!(!mirrored.contains("quiet"));
    assert!(mirrored.contains("loud"));
    assert_eq!(mirrored.lines().count(), 1);
}

#[test]
fn test_to_stderr_writes_no_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let console = MemorySink::new("console");
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .to_stderr(true)
        .console(console.clone())
        .flush_interval(Duration::ZERO)
        .build()
        .expect("Failed to build logger");

    logger.error("console only");
    logger.flush();
    assert!(console.contents().contains("console only"));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_from_json_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let json = format!(
        r#"{{
            "program_name": "node",
            "log_dirs": [{:?}],
            "verbosity": 1,
            "vmodule": "integration_tests=4",
            "stderr_threshold": null,
            "flush_interval_secs": 0
        }}"#,
        temp_dir.path().display().to_string()
    );
    let config = LoggerConfig::from_json(&json).expect("Failed to parse config");
    let logger = Logger::from_config(config).expect("Failed to build logger");
    assert_eq!(logger.verbosity(), 1);
    assert!(logger.v(4).enabled());

    logger.info("configured");
    logger.flush();
    assert_eq!(files_in(temp_dir.path(), ".log.INFO.").len(), 1);
}

#[test]
fn test_extract_timestamp() {
    let prefix = "node.host.user.log.";
    let cases = [
        ("node.host.user.log.INFO.20171204-100000.1234", "20171204-100000"),
        ("node.host.user.log.ERROR.20171204-100000.1234.gz", "20171204-100000"),
        ("node.host.user.log.INFO.20171304-100000.1234", ""),
        ("node.host.user.log.INFO.2017-12-04.1234", ""),
        ("other.host.user.log.INFO.20171204-100000.1234", ""),
        ("node.host.user.log.", ""),
    ];
    for (name, expected) in cases {
        assert_eq!(extract_timestamp(name, prefix), expected, "{}", name);
    }
}
