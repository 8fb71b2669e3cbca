use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Rotation defaults read from `TEELOG_*` environment variables.
#[derive(FromEnv)]
#[from_env(prefix = "TEELOG")]
#[allow(non_snake_case)]
pub struct TeeLogConfig {
    #[from_env(default = "100")]
    pub MAX_SIZE_MB: u64,
    /// 0 keeps every backup.
    #[from_env(default = "60")]
    pub MAX_BACKUPS: usize,
    /// 0 disables age-based rotation.
    #[from_env(default = "24")]
    pub MAX_AGE_HOURS: u64,
    #[from_env(default = "false")]
    pub COMPRESS: bool,
}

impl Default for TeeLogConfig {
    fn default() -> Self {
        Self {
            MAX_SIZE_MB: 100,
            MAX_BACKUPS: 60,
            MAX_AGE_HOURS: 24,
            COMPRESS: false,
        }
    }
}

pub static TEELOG_CONFIG: LazyLock<TeeLogConfig> =
    LazyLock::new(|| TeeLogConfig::from_env().unwrap_or_default());
