use std::{
    fs::File,
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

/// A destination for encoded log lines.
///
/// `line` never contains the trailing newline; writers append it and must emit the whole
/// line in a single write so that concurrent records never interleave.
pub trait LogWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;

    /// Failures of work done off the write path, such as compressing rotated backups.
    fn background_errors(&self) -> u64 {
        0
    }
}

pub(crate) fn with_newline(line: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    buf
}

/// Appends to a single file, without rotation.
pub struct LogFile {
    file: File,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let file = File::options().create(true).append(true).open(&path)?;
        Ok(Self { file })
    }
}

impl LogWriter for LogFile {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(&with_newline(line))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Writes to the process standard output.
#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&with_newline(line))?;
        stdout.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// In-memory writer; clones share the same buffer.
#[derive(Default, Debug, Clone)]
pub struct BufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl LogWriter for BufferWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        buf.extend_from_slice(&with_newline(line));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_log_file() {
    std::fs::remove_file("/tmp/teelog_test_log_file.log").ok();
    let mut log_file = LogFile::new("/tmp/teelog_test_log_file.log").unwrap();
    log_file.write_line("Hello, world!").unwrap();
    log_file.write_line("rust is awesome !").unwrap();
    log_file.flush().unwrap();
    drop(log_file);
    // Reopening appends instead of truncating.
    let mut log_file = LogFile::new("/tmp/teelog_test_log_file.log").unwrap();
    log_file.write_line("test").unwrap();
    assert_eq!(
        std::fs::read_to_string("/tmp/teelog_test_log_file.log").unwrap(),
        "Hello, world!\nrust is awesome !\ntest\n"
    );
}

#[test]
fn test_buffer_writer_shared_between_clones() {
    let buffer = BufferWriter::new();
    let mut writer = buffer.clone();
    writer.write_line("one").unwrap();
    writer.write_line("two").unwrap();
    assert_eq!(buffer.lines(), vec!["one", "two"]);
    buffer.clear();
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_log_stdout() {
    let mut log_stdout = LogStdout;
    log_stdout.write_line("{\"msg\":\"Hello, world!\"}").unwrap();
    log_stdout.flush().unwrap();
}
