use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeDelta, Utc};
use crossbeam_channel::{Sender, unbounded};
use flate2::{Compression, write::GzEncoder};

use crate::{
    config::TEELOG_CONFIG,
    log_writer::{LogWriter, with_newline},
};

#[cfg(not(test))]
mod limits {
    pub const MIN_FILE_SIZE: u64 = 4_096;
    pub const MIN_AGE_MS: u64 = 1_000;
}


const MEGABYTE: u64 = 1024 * 1024;
const BACKUP_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%6f";
const GZ_SUFFIX: &str = ".gz";

/// When the active file is rotated and how many archives are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Maximum size of the active file in bytes.
    pub max_size: u64,
    /// Maximum number of archived files; `None` keeps them all.
    pub max_backups: Option<usize>,
    /// Maximum age of the active file; `None` never rotates on age.
    pub max_age: Option<Duration>,
    /// Gzip archived files.
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 100 * MEGABYTE,
            max_backups: Some(60),
            max_age: Some(Duration::from_secs(24 * 3600)),
            compress: false,
        }
    }
}

impl RotationPolicy {
    /// Policy built from the `TEELOG_*` environment configuration.
    pub fn from_config() -> Self {
        let config = &*TEELOG_CONFIG;
        Self {
            max_size: config.MAX_SIZE_MB.saturating_mul(MEGABYTE),
            max_backups: (config.MAX_BACKUPS > 0).then_some(config.MAX_BACKUPS),
            max_age: (config.MAX_AGE_HOURS > 0)
                .then(|| Duration::from_secs(config.MAX_AGE_HOURS.saturating_mul(3600))),
            compress: config.COMPRESS,
        }
    }

    pub fn validate(&self) -> Result<(), io::Error> {
        if self.max_size < limits::MIN_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("max_size must be at least {} bytes", limits::MIN_FILE_SIZE),
            ));
        }
        if let Some(max_age) = self.max_age
            && max_age.as_millis() < limits::MIN_AGE_MS as u128
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("max_age must be at least {} ms", limits::MIN_AGE_MS),
            ));
        }
        if self.max_backups == Some(0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max_backups must be at least 1",
            ));
        }
        Ok(())
    }
}

/// An archived log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub rotated_at: NaiveDateTime,
    pub compressed: bool,
}

/// Names archives `<stem>-<timestamp>[.<ext>][.gz]` next to the active file.
#[derive(Debug, Clone)]
struct BackupNaming {
    folder: PathBuf,
    prefix: String,
    suffix: String,
}

impl BackupNaming {
    fn new(path: &Path) -> Result<Self, io::Error> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("log path {} has no file name", path.display()),
                )
            })?;
        let suffix = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let folder = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            folder,
            prefix: format!("{stem}-"),
            suffix,
        })
    }

    fn path_for(&self, rotated_at: DateTime<Utc>) -> PathBuf {
        let timestamp = rotated_at.format(BACKUP_TIME_FORMAT);
        self.folder
            .join(format!("{}{timestamp}{}", self.prefix, self.suffix))
    }

    fn parse(&self, name: &str) -> Option<(NaiveDateTime, bool)> {
        let (name, compressed) = match name.strip_suffix(GZ_SUFFIX) {
            Some(name) => (name, true),
            None => (name, false),
        };
        let timestamp = name
            .strip_prefix(&self.prefix)?
            .strip_suffix(self.suffix.as_str())?;
        let rotated_at = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIME_FORMAT).ok()?;
        Some((rotated_at, compressed))
    }

    /// Archives sorted oldest first. An uncompressed archive hides a stale `.gz` twin.
    fn list(&self) -> Result<Vec<Backup>, io::Error> {
        let mut backups = BTreeMap::new();
        for entry in fs::read_dir(&self.folder)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some((rotated_at, compressed)) = self.parse(&name) else {
                continue;
            };
            let backup = Backup {
                path: entry.path(),
                rotated_at,
                compressed,
            };
            let shadowed = matches!(
                backups.get(&rotated_at),
                Some(Backup {
                    compressed: false,
                    ..
                })
            );
            if !shadowed {
                backups.insert(rotated_at, backup);
            }
        }
        Ok(backups.into_values().collect())
    }
}

/// Lists the archives of the log file at `path`, oldest first.
pub fn backups<P: AsRef<Path>>(path: P) -> Result<Vec<Backup>, io::Error> {
    BackupNaming::new(path.as_ref())?.list()
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(GZ_SUFFIX);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<(), io::Error> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn compress_file(path: &Path) -> Result<(), io::Error> {
    let mut src = File::open(path)?;
    let dst = File::create(gz_path(path))?;
    let mut encoder = GzEncoder::new(dst, Compression::default());
    io::copy(&mut src, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(path)
}

fn run_mill(
    naming: &BackupNaming,
    max_backups: Option<usize>,
    compress: bool,
) -> Result<(), io::Error> {
    let mut backups = naming.list()?;
    if let Some(max_backups) = max_backups
        && backups.len() > max_backups
    {
        let excess = backups.len() - max_backups;
        for oldest in backups.drain(..excess) {
            remove_if_exists(&oldest.path)?;
            if !oldest.compressed {
                remove_if_exists(&gz_path(&oldest.path))?;
            }
        }
    }
    if compress {
        for backup in backups.iter().filter(|b| !b.compressed) {
            compress_file(&backup.path)?;
        }
    }
    Ok(())
}

/// Background thread compressing and pruning archives after each rotation.
struct Mill {
    sender: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Mill {
    fn spawn(naming: BackupNaming, policy: &RotationPolicy, errors: Arc<AtomicU64>) -> Self {
        let (sender, receiver) = unbounded::<()>();
        let max_backups = policy.max_backups;
        let compress = policy.compress;
        let handle = std::thread::spawn(move || {
            while receiver.recv().is_ok() {
                // Coalesce rotations that happened while the previous run was busy.
                while receiver.try_recv().is_ok() {}
                if run_mill(&naming, max_backups, compress).is_err() {
                    errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    fn notify(&self) {
        if let Some(sender) = &self.sender {
            sender.send(()).ok();
        }
    }
}

impl Drop for Mill {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain pending work and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

/// A log file that rotates on size or age and keeps a bounded number of archives.
///
/// Every line is appended with a single unbuffered write, so nothing is lost when the
/// process exits without dropping the writer. Dropping it waits for pending
/// compression and retention work.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    naming: BackupNaming,
    file: Option<File>,
    size: u64,
    opened_at: DateTime<Utc>,
    last_rotation: Option<DateTime<Utc>>,
    mill_errors: Arc<AtomicU64>,
    mill: Mill,
}

impl RotatingFile {
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self, io::Error> {
        policy.validate()?;
        let path = path.as_ref().to_path_buf();
        let naming = BackupNaming::new(&path)?;
        fs::create_dir_all(&naming.folder)?;
        let mill_errors = Arc::new(AtomicU64::new(0));
        let mill = Mill::spawn(naming.clone(), &policy, Arc::clone(&mill_errors));
        let mut writer = Self {
            path,
            policy,
            naming,
            file: None,
            size: 0,
            opened_at: Utc::now(),
            last_rotation: None,
            mill_errors,
            mill,
        };
        writer.open()?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Failed compression or retention runs.
    pub fn mill_errors(&self) -> u64 {
        self.mill_errors.load(Ordering::Relaxed)
    }

    fn open(&mut self) -> Result<(), io::Error> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let metadata = file.metadata()?;
        self.size = metadata.len();
        self.opened_at = metadata
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        self.file = Some(file);
        Ok(())
    }

    fn expired(&mut self) -> bool {
        let Some(max_age) = self.policy.max_age else {
            return false;
        };
        if self.size == 0 {
            // Rotating an empty file would only produce an empty archive.
            self.opened_at = Utc::now();
            return false;
        }
        (Utc::now() - self.opened_at)
            .to_std()
            .is_ok_and(|age| age >= max_age)
    }

    fn should_rotate(&mut self, incoming: u64) -> bool {
        (self.size > 0 && self.size + incoming > self.policy.max_size) || self.expired()
    }

    /// Strictly increasing across rotations so archive names never collide.
    fn next_rotation_time(&self) -> DateTime<Utc> {
        let step = TimeDelta::microseconds(1);
        let mut rotated_at = Utc::now().trunc_subsecs(6);
        if let Some(last) = self.last_rotation
            && rotated_at <= last
        {
            rotated_at = last + step;
        }
        while self.naming.path_for(rotated_at).exists() {
            rotated_at += step;
        }
        rotated_at
    }

    /// Archives the active file and starts a fresh one at the original path.
    pub fn rotate(&mut self) -> Result<(), io::Error> {
        // Close before renaming.
        self.file = None;
        let rotated_at = self.next_rotation_time();
        let renamed = fs::rename(&self.path, self.naming.path_for(rotated_at));
        // Reopen even if the rename failed so logging can go on in the old file.
        self.open()?;
        renamed?;
        self.last_rotation = Some(rotated_at);
        self.mill.notify();
        Ok(())
    }
}

impl LogWriter for RotatingFile {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let bytes = with_newline(line);
        // A failed rotation still lets the line land in whichever file is open.
        let rotated = if self.should_rotate(bytes.len() as u64) {
            self.rotate()
        } else {
            Ok(())
        };
        if self.file.is_none() {
            self.open()?;
        }
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("log file is not open"));
        };
        file.write_all(&bytes)?;
        self.size += bytes.len() as u64;
        rotated
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn background_errors(&self) -> u64 {
        self.mill_errors()
    }
}
