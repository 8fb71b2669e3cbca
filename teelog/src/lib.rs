//! # teelog
//! Process-wide JSON logger writing to the console and a rotating log file.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! teelog = "0.1.0"
//! ```
//!
//! ```rust
//! teelog::init_dev("/tmp/teelog_doc_dev.log").unwrap();
//! teelog::info!("hello", user = "lzc");
//! // {"level":"INFO","ts":"2026-10-14T09:30:00.123+0200","msg":"hello","func":"main","file":"/home/me/app/src/main.rs","line":3,"user":"lzc"}
//! ```
//!
//! ## Production and development
//! [`init_prod`] writes INFO and above to the file only. [`init_dev`] writes DEBUG and
//! above to both stdout and the file. Calling an initializer again replaces the
//! previous logger, closing its file.
//!
//! ```rust
//! teelog::init_prod("/tmp/teelog_doc_prod.log").unwrap();
//! teelog::debug!("hidden", x = 1);
//! teelog::info!("kept", x = 2);
//! let content = std::fs::read_to_string("/tmp/teelog_doc_prod.log").unwrap();
//! assert!(!content.contains("hidden"));
//! assert!(content.lines().last().unwrap().contains("\"msg\":\"kept\""));
//! ```
//!
//! ## Structured fields
//! Any `Serialize` value can be attached with [`any`]:
//!
//! ```rust
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let logger = teelog::logger_config().no_stdout().build().unwrap();
//! let user = User { name: "lzc".into() };
//! teelog::info!(logger: &logger, "Info test log", user = teelog::any(&user));
//! ```
//!
//! ## Rotation
//! The log file rotates when it would exceed `max_size` or once it is older than
//! `max_age`. Archives are named `<stem>-<timestamp>.<ext>` next to the active file and
//! the oldest are removed beyond `max_backups`. Defaults come from `TEELOG_MAX_SIZE_MB`,
//! `TEELOG_MAX_BACKUPS`, `TEELOG_MAX_AGE_HOURS` and `TEELOG_COMPRESS`.
//!
//! ```rust
//! use std::time::Duration;
//! use teelog::{LevelFilter, RotationPolicy, logger_config};
//!
//! logger_config()
//!     .no_stdout()
//!     .with_rotation(RotationPolicy {
//!         max_size: 10 * 1024 * 1024,
//!         max_backups: Some(5),
//!         max_age: Some(Duration::from_secs(3600)),
//!         compress: true,
//!     })
//!     .with_log_file("/tmp/teelog_doc_rotation/app.log", LevelFilter::Info)
//!     .init_global()
//!     .unwrap();
//! teelog::warn!("rotating", every = "hour");
//! ```

mod logger;
mod macros;

use std::{
    path::Path,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use log::Log;

pub use log::{Level, LevelFilter};
pub use logger::{ConfigBuilder, Logger, logger_config};
pub use teelog_core::{
    Backup, BufferWriter, Caller, Field, FieldValue, LogWriter, RotationPolicy, any, backups,
    display,
};

#[doc(hidden)]
pub mod __private {
    pub use teelog_core::{absolute_source_path, short_function_name};
}

/// The process-wide logger, unset until an initializer runs.
static GLOBAL_LOGGER: LazyLock<RwLock<Option<Arc<Logger>>>> = LazyLock::new(|| {
    // Fails only if the application installed another `log` backend; the macros still work.
    log::set_boxed_logger(Box::new(LogBridge)).ok();
    RwLock::new(None)
});

/// Forwards records from the `log` crate facade to the process-wide logger.
struct LogBridge;

impl Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        global().is_some_and(|logger| logger.enabled(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let Some(logger) = global() else {
            return;
        };
        if !logger.enabled(record.level()) {
            return;
        }
        let caller = record
            .file()
            .zip(record.line())
            .map(|(file, line)| Caller {
                func: None,
                file,
                line,
            });
        logger.log(record.level(), record.args().to_string(), &[], caller);
    }

    fn flush(&self) {
        flush();
    }
}

/// File only, INFO and above.
pub fn init_prod<P: AsRef<Path>>(path: P) -> Result<(), std::io::Error> {
    set_global(Logger::production(path)?);
    Ok(())
}

/// Console and file, DEBUG and above.
pub fn init_dev<P: AsRef<Path>>(path: P) -> Result<(), std::io::Error> {
    set_global(Logger::development(path)?);
    Ok(())
}

/// Installs `logger` as the process-wide instance, replacing any previous one.
///
/// The previous logger is dropped once in-flight calls release it.
pub fn set_global(logger: Logger) {
    let max_level = logger.max_level();
    let previous = GLOBAL_LOGGER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(Arc::new(logger));
    log::set_max_level(max_level);
    drop(previous);
}

/// Removes the process-wide logger. Later calls are dropped until the next init.
pub fn reset() {
    let previous = GLOBAL_LOGGER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    log::set_max_level(LevelFilter::Off);
    drop(previous);
}

pub fn global() -> Option<Arc<Logger>> {
    GLOBAL_LOGGER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Whether an initializer has run.
pub fn is_ready() -> bool {
    global().is_some()
}

pub fn flush() {
    if let Some(logger) = global() {
        logger.flush();
    }
}

/// Failed writes of the process-wide logger, 0 when uninitialized.
pub fn write_errors() -> u64 {
    global().map_or(0, |logger| logger.write_errors())
}
