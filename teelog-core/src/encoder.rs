//! JSON line encoding of log records.

use chrono::{DateTime, Local};
use log::Level;
use serde::Serialize;

use crate::{caller::Caller, field::Field};

pub const LEVEL_KEY: &str = "level";
pub const TIME_KEY: &str = "ts";
pub const MESSAGE_KEY: &str = "msg";
pub const FUNC_KEY: &str = "func";
pub const FILE_KEY: &str = "file";
pub const LINE_KEY: &str = "line";

/// Prefix given to caller fields whose key collides with a standard key.
pub const RESERVED_PREFIX: &str = "fields.";

const RESERVED_KEYS: [&str; 6] = [LEVEL_KEY, TIME_KEY, MESSAGE_KEY, FUNC_KEY, FILE_KEY, LINE_KEY];

/// ISO-8601 with milliseconds and numeric UTC offset.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// A single log event, borrowed from the logging call.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: Level,
    pub time: DateTime<Local>,
    pub message: &'a str,
    pub caller: Option<Caller<'a>>,
    pub fields: &'a [Field],
}

impl<'a> Record<'a> {
    /// Creates a record stamped with the current local time.
    pub fn new(
        level: Level,
        message: &'a str,
        fields: &'a [Field],
        caller: Option<Caller<'a>>,
    ) -> Self {
        Self {
            level,
            time: Local::now(),
            message,
            caller,
            fields,
        }
    }
}

struct JsonLine {
    buf: Vec<u8>,
}

impl JsonLine {
    fn new() -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.push(b'{');
        Self { buf }
    }

    fn entry<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) {
        if self.buf.len() > 1 {
            self.buf.push(b',');
        }
        // Strings, integers and `FieldValue`s cannot fail to serialize into a Vec.
        let _ = serde_json::to_writer(&mut self.buf, key);
        self.buf.push(b':');
        let _ = serde_json::to_writer(&mut self.buf, value);
    }

    fn finish(mut self) -> String {
        self.buf.push(b'}');
        String::from_utf8(self.buf)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
}

/// Encodes a record as one JSON object without a trailing newline.
///
/// Standard keys come first (`level`, `ts`, `msg`, `func`, `file`, `line`), followed by
/// the caller-supplied fields in call order. A caller field named like a standard key is
/// written as `fields.<key>` so that neither copy is lost.
pub fn encode(record: &Record) -> String {
    let mut line = JsonLine::new();
    line.entry(LEVEL_KEY, record.level.as_str());
    line.entry(TIME_KEY, &record.time.format(TIME_FORMAT).to_string());
    line.entry(MESSAGE_KEY, record.message);
    if let Some(caller) = &record.caller {
        if let Some(func) = caller.func {
            line.entry(FUNC_KEY, func);
        }
        line.entry(FILE_KEY, caller.file);
        line.entry(LINE_KEY, &caller.line);
    }
    for field in record.fields {
        if RESERVED_KEYS.contains(&field.key.as_str()) {
            line.entry(&format!("{RESERVED_PREFIX}{}", field.key), &field.value);
        } else {
            line.entry(&field.key, &field.value);
        }
    }
    line.finish()
}
