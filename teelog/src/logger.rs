use std::path::{Path, PathBuf};

use log::{Level, LevelFilter};
use teelog_core::{
    Caller, Destination, Field, LogFile, LogStdout, LogWriter, Record, RotatingFile,
    RotationPolicy, Tee,
};

/// A configured set of destinations. Cheap to share behind an `Arc`.
pub struct Logger {
    tee: Tee,
}

impl Logger {
    /// File only, INFO and above.
    pub fn production<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        logger_config()
            .no_stdout()
            .with_log_file(path, LevelFilter::Info)
            .build()
    }

    /// Console and file, DEBUG and above on both.
    pub fn development<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        logger_config()
            .with_stdout(LevelFilter::Debug)
            .with_log_file(path, LevelFilter::Debug)
            .build()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.tee.enabled(level)
    }

    pub fn max_level(&self) -> LevelFilter {
        self.tee.max_level()
    }

    /// Names of the configured destinations, in write order.
    pub fn destinations(&self) -> Vec<&str> {
        self.tee.destinations().iter().map(Destination::name).collect()
    }

    pub fn log<M: AsRef<str>>(
        &self,
        level: Level,
        message: M,
        fields: &[Field],
        caller: Option<Caller<'_>>,
    ) {
        if !self.enabled(level) {
            return;
        }
        self.tee
            .write(&Record::new(level, message.as_ref(), fields, caller));
    }

    pub fn flush(&self) {
        self.tee.flush();
    }

    /// Failed writes and background failures so far; logging calls themselves never report them.
    pub fn write_errors(&self) -> u64 {
        self.tee.write_errors()
    }
}

/// Builder for configuring a [`Logger`].
pub struct ConfigBuilder {
    stdout: Option<LevelFilter>,
    log_file: Option<(PathBuf, LevelFilter)>,
    rotation: Option<RotationPolicy>,
    writers: Vec<Destination>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            stdout: Some(LevelFilter::Info),
            log_file: None,
            rotation: Some(RotationPolicy::from_config()),
            writers: Vec::new(),
        }
    }
}

impl ConfigBuilder {
    /// Log to stdout at `level` and above.
    pub fn with_stdout(self, level: LevelFilter) -> Self {
        Self {
            stdout: Some(level),
            ..self
        }
    }
    /// Ignore stdout logging
    pub fn no_stdout(self) -> Self {
        Self {
            stdout: None,
            ..self
        }
    }
    /// Log to a file at `level` and above. The file is opened by [`ConfigBuilder::build`].
    pub fn with_log_file<P: AsRef<Path>>(self, path: P, level: LevelFilter) -> Self {
        Self {
            log_file: Some((path.as_ref().to_path_buf(), level)),
            ..self
        }
    }
    /// Maybe sets a log file.
    pub fn maybe_with_log_file<P: AsRef<Path>>(self, path: Option<P>, level: LevelFilter) -> Self {
        Self {
            log_file: path.map(|p| (p.as_ref().to_path_buf(), level)),
            ..self
        }
    }
    /// Rotation policy of the log file.
    pub fn with_rotation(self, policy: RotationPolicy) -> Self {
        Self {
            rotation: Some(policy),
            ..self
        }
    }
    /// Append to the log file forever
    pub fn no_rotation(self) -> Self {
        Self {
            rotation: None,
            ..self
        }
    }
    /// Adds a custom destination, written after stdout and before the log file.
    pub fn with_writer<W: LogWriter + Send + 'static>(
        mut self,
        name: &str,
        level: LevelFilter,
        writer: W,
    ) -> Self {
        self.writers.push(Destination::new(name, level, writer));
        self
    }

    pub fn build(self) -> Result<Logger, std::io::Error> {
        let Self {
            stdout,
            log_file,
            rotation,
            writers,
        } = self;
        let mut destinations = Vec::with_capacity(writers.len() + 2);
        if let Some(level) = stdout {
            destinations.push(Destination::new("console", level, LogStdout));
        }
        destinations.extend(writers);
        if let Some((path, level)) = log_file {
            let destination = match rotation {
                Some(policy) => Destination::new("file", level, RotatingFile::new(path, policy)?),
                None => {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        std::fs::create_dir_all(parent)?;
                    }
                    Destination::new("file", level, LogFile::new(path)?)
                }
            };
            destinations.push(destination);
        }
        Ok(Logger {
            tee: Tee::new(destinations),
        })
    }

    /// Builds the logger and installs it as the process-wide instance.
    pub fn init_global(self) -> Result<(), std::io::Error> {
        crate::set_global(self.build()?);
        Ok(())
    }
}

/// Returns a default ConfigBuilder for configuring the logger.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{debug, error, info, warn};
    use serde_json::Value;
    use teelog_core::BufferWriter;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/teelog_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_production_is_file_only_at_info() {
        let dir = test_dir("logger_production");
        let path = dir.join("prod.log");
        let logger = Logger::production(&path).unwrap();
        assert_eq!(logger.destinations(), vec!["file"]);
        assert_eq!(logger.max_level(), LevelFilter::Info);

        debug!(logger: &logger, "hidden", x = 1);
        info!(logger: &logger, "shown", x = 2);
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let record = parse(lines[0]);
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["msg"], "shown");
        assert_eq!(record["x"], 2);
    }

    #[test]
    fn test_development_wires_console_and_file() {
        let dir = test_dir("logger_development");
        let logger = Logger::development(dir.join("dev.log")).unwrap();
        assert_eq!(logger.destinations(), vec!["console", "file"]);
        assert_eq!(logger.max_level(), LevelFilter::Debug);
        assert!(logger.enabled(Level::Debug));
    }

    #[test]
    fn test_records_duplicated_to_every_destination() {
        let dir = test_dir("logger_duplicated");
        let path = dir.join("dev.log");
        let console = BufferWriter::new();
        let logger = logger_config()
            .no_stdout()
            .with_writer("console", LevelFilter::Debug, console.clone())
            .with_log_file(&path, LevelFilter::Debug)
            .build()
            .unwrap();

        info!(logger: &logger, "hello", user = "lzc");
        debug!(logger: &logger, "details", step = 2);

        let file_lines: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(console.lines(), file_lines);
        assert_eq!(file_lines.len(), 2);
        let hello = parse(&file_lines[0]);
        assert_eq!(hello["level"], "INFO");
        assert_eq!(hello["msg"], "hello");
        assert_eq!(hello["user"], "lzc");
        assert_eq!(parse(&file_lines[1])["level"], "DEBUG");
    }

    #[test]
    fn test_caller_fields_match_call_site() {
        let console = BufferWriter::new();
        let logger = logger_config()
            .no_stdout()
            .with_writer("console", LevelFilter::Debug, console.clone())
            .build()
            .unwrap();

        let line = line!() + 1;
        warn!(logger: &logger, "careful");
        let record = parse(&console.lines()[0]);
        assert_eq!(record["func"], "test_caller_fields_match_call_site");
        let file = record["file"].as_str().unwrap();
        assert!(Path::new(file).is_absolute(), "{file}");
        assert!(Path::new(file).is_file(), "{file}");
        assert!(file.ends_with(file!()), "{file}");
        assert_eq!(record["line"], line);
    }

    #[test]
    fn test_caller_inside_closure_uses_enclosing_function() {
        let console = BufferWriter::new();
        let logger = logger_config()
            .no_stdout()
            .with_writer("console", LevelFilter::Debug, console.clone())
            .build()
            .unwrap();
        let log_from_closure = || error!(logger: &logger, "from closure");
        log_from_closure();
        let record = parse(&console.lines()[0]);
        assert_eq!(record["func"], "test_caller_inside_closure_uses_enclosing_function");
        assert_eq!(record["level"], "ERROR");
    }

    #[test]
    fn test_fields_round_trip() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
        }
        let console = BufferWriter::new();
        let logger = logger_config()
            .no_stdout()
            .with_writer("console", LevelFilter::Debug, console.clone())
            .build()
            .unwrap();
        let user = User { name: "lzc".into() };
        info!(
            logger: &logger,
            "Info test log",
            user = crate::any(&user),
            attempts = 3,
            ratio = 0.25,
            cached = false,
        );
        let record = parse(&console.lines()[0]);
        let object = record.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["attempts", "cached", "file", "func", "level", "line", "msg", "ratio", "ts", "user"]
        );
        assert_eq!(record["user"]["name"], "lzc");
        assert_eq!(record["attempts"], 3);
        assert_eq!(record["ratio"], 0.25);
        assert_eq!(record["cached"], false);
    }

    #[test]
    fn test_plain_file_without_rotation() {
        let dir = test_dir("logger_no_rotation");
        let path = dir.join("plain/app.log");
        let logger = logger_config()
            .no_stdout()
            .no_rotation()
            .with_log_file(&path, LevelFilter::Warn)
            .build()
            .unwrap();
        info!(logger: &logger, "dropped");
        error!(logger: &logger, "kept");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"msg\":\"kept\""));
    }

    #[test]
    fn test_maybe_with_log_file() {
        let without = logger_config()
            .no_stdout()
            .maybe_with_log_file(None::<&Path>, LevelFilter::Info)
            .build()
            .unwrap();
        assert!(without.destinations().is_empty());
        assert_eq!(without.max_level(), LevelFilter::Off);

        let dir = test_dir("logger_maybe_file");
        let path = dir.join("maybe.log");
        let with = logger_config()
            .no_stdout()
            .maybe_with_log_file(Some(&path), LevelFilter::Info)
            .build()
            .unwrap();
        assert_eq!(with.destinations(), vec!["file"]);
        info!(logger: &with, "optional file", x = 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(parse(content.lines().next().unwrap())["msg"], "optional file");
    }

    #[test]
    fn test_invalid_rotation_is_rejected() {
        let dir = test_dir("logger_invalid_rotation");
        let result = logger_config()
            .no_stdout()
            .with_rotation(RotationPolicy {
                max_size: 1,
                ..RotationPolicy::default()
            })
            .with_log_file(dir.join("app.log"), LevelFilter::Info)
            .build();
        assert_eq!(
            result.err().unwrap().kind(),
            std::io::ErrorKind::InvalidInput
        );
    }
}
