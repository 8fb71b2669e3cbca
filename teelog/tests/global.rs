use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
};

use serde_json::Value;
use teelog::{LevelFilter, RotationPolicy, debug, error, info, logger_config, warn};

/// The process-wide logger is shared by every test in this binary.
static GLOBAL: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn test_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(format!("/tmp/teelog_test_{name}"));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn records(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn dev_logger_writes_info_record_to_file() {
    let _guard = lock();
    let dir = test_dir("global_dev");
    let path = dir.join("dev.log");
    teelog::init_dev(&path).unwrap();
    assert!(teelog::is_ready());

    let line = line!() + 1;
    info!("hello", user = "lzc");
    debug!("details", step = 1);

    let records = records(&path);
    assert_eq!(records.len(), 2);
    let hello = &records[0];
    assert_eq!(hello["level"], "INFO");
    assert_eq!(hello["msg"], "hello");
    assert_eq!(hello["user"], "lzc");
    assert_eq!(hello["func"], "dev_logger_writes_info_record_to_file");
    let file = hello["file"].as_str().unwrap();
    assert!(Path::new(file).is_absolute(), "{file}");
    assert!(file.ends_with(file!()), "{file}");
    assert_eq!(hello["line"], line);
    assert_eq!(records[1]["level"], "DEBUG");
    teelog::reset();
}

/// Set in the child process spawned by `dev_logger_prints_file_lines_to_stdout`.
const DEV_CHILD_ENV: &str = "TEELOG_TEST_DEV_CHILD";

#[test]
fn dev_logger_prints_file_lines_to_stdout() {
    if let Ok(path) = env::var(DEV_CHILD_ENV) {
        teelog::init_dev(&path).unwrap();
        info!("hello", user = "lzc");
        debug!("details", step = 1);
        teelog::reset();
        return;
    }

    let _guard = lock();
    let dir = test_dir("global_dev_stdout");
    let path = dir.join("dev.log");
    let output = Command::new(env::current_exe().unwrap())
        .args([
            "dev_logger_prints_file_lines_to_stdout",
            "--exact",
            "--nocapture",
            "--test-threads=1",
            "-q",
        ])
        .env(DEV_CHILD_ENV, &path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let printed: Vec<&str> = stdout.lines().filter(|l| l.starts_with('{')).collect();
    let content = fs::read_to_string(&path).unwrap();
    let written: Vec<&str> = content.lines().collect();
    assert_eq!(printed, written);
    assert_eq!(written.len(), 2);
    let hello: Value = serde_json::from_str(written[0]).unwrap();
    assert_eq!(hello["level"], "INFO");
    assert_eq!(hello["msg"], "hello");
    assert_eq!(hello["user"], "lzc");
}

#[test]
fn prod_logger_drops_debug_records() {
    let _guard = lock();
    let dir = test_dir("global_prod");
    let path = dir.join("prod.log");
    teelog::init_prod(&path).unwrap();

    debug!("hidden", x = 1);
    assert!(records(&path).is_empty());

    warn!("shown", x = 2);
    error!("failed", code = 500);
    let records = records(&path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "WARN");
    assert_eq!(records[0]["x"], 2);
    assert_eq!(records[1]["level"], "ERROR");
    assert_eq!(records[1]["code"], 500);
    teelog::reset();
}

#[test]
fn log_crate_records_are_bridged() {
    let _guard = lock();
    let dir = test_dir("global_bridge");
    let path = dir.join("bridge.log");
    teelog::init_prod(&path).unwrap();

    log::debug!("below threshold");
    let line = line!() + 1;
    log::info!("from the log facade {}", 42);

    let records = records(&path);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["msg"], "from the log facade 42");
    assert_eq!(record["level"], "INFO");
    // The `log` crate reports the path as the compiler saw it.
    assert_eq!(record["file"], file!());
    assert_eq!(record["line"], line);
    assert!(record.get("func").is_none());
    teelog::reset();
}

#[test]
fn logging_without_logger_is_a_no_op() {
    let _guard = lock();
    teelog::reset();
    assert!(!teelog::is_ready());
    info!("nobody listens", x = 1);
    log::error!("nor here");
    teelog::flush();
    assert_eq!(teelog::write_errors(), 0);
}

#[test]
fn reinit_replaces_previous_logger() {
    let _guard = lock();
    let dir = test_dir("global_reinit");
    let first = dir.join("first.log");
    let second = dir.join("second.log");
    teelog::init_prod(&first).unwrap();
    info!("one");
    teelog::init_prod(&second).unwrap();
    info!("two");

    let first_records = records(&first);
    let second_records = records(&second);
    assert_eq!(first_records.len(), 1);
    assert_eq!(first_records[0]["msg"], "one");
    assert_eq!(second_records.len(), 1);
    assert_eq!(second_records[0]["msg"], "two");
    teelog::reset();
}

#[test]
fn reinit_while_logging_from_many_threads() {
    let _guard = lock();
    let dir = test_dir("global_reinit_concurrent");
    let first = dir.join("first.log");
    let second = dir.join("second.log");
    teelog::init_prod(&first).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..200 {
                    info!("concurrent reinit", thread = t, i = i);
                }
            })
        })
        .collect();
    for round in 0..20 {
        let path = if round % 2 == 0 { &second } else { &first };
        teelog::init_prod(path).unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    teelog::reset();

    let mut total = 0;
    for path in [&first, &second] {
        for record in records(path) {
            assert_eq!(record["msg"], "concurrent reinit");
            assert_eq!(record["level"], "INFO");
            total += 1;
        }
    }
    assert_eq!(total, 800);
    assert!(!teelog::is_ready());
}

#[test]
fn global_rotation_keeps_bounded_backups() {
    let _guard = lock();
    let dir = test_dir("global_rotation");
    let path = dir.join("app.log");
    logger_config()
        .no_stdout()
        .with_rotation(RotationPolicy {
            max_size: 4096,
            max_backups: Some(2),
            max_age: None,
            compress: false,
        })
        .with_log_file(&path, LevelFilter::Info)
        .init_global()
        .unwrap();

    for i in 0..200 {
        info!("filling the log file", i = i, padding = "x".repeat(64));
    }
    // Dropping the logger waits for retention to finish.
    teelog::reset();

    let backups = teelog::backups(&path).unwrap();
    assert_eq!(backups.len(), 2);
    assert!(fs::metadata(&path).unwrap().len() <= 4096);
    let last = records(&path);
    assert_eq!(last.last().unwrap()["i"], 199);
}

#[test]
fn init_fails_on_unusable_path() {
    let _guard = lock();
    let dir = test_dir("global_bad_path");
    fs::create_dir_all(&dir).unwrap();
    // A directory cannot be opened as the log file.
    assert!(teelog::init_prod(&dir).is_err());
}
