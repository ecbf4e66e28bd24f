use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DAY_FILE: &str = "day_cleaned.csv";
pub const HOUR_FILE: &str = "hour_cleaned.csv";

pub const DAY_PATH_VAR: &str = "BIKESHARE_DAY_PATH";
pub const HOUR_PATH_VAR: &str = "BIKESHARE_HOUR_PATH";
pub const DATA_DIR_VAR: &str = "BIKESHARE_DATA_DIR";

/// Storage locations of the daily and hourly tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataSource {
    pub day: PathBuf,
    pub hour: PathBuf,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            day: PathBuf::from(DAY_FILE),
            hour: PathBuf::from(HOUR_FILE),
        }
    }
}

impl DataSource {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            day: dir.join(DAY_FILE),
            hour: dir.join(HOUR_FILE),
        }
    }

    /// Defaults overridden by `BIKESHARE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var_os(name))
    }

    /// Per-file variables take precedence over the data directory.
    fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut source = match var(DATA_DIR_VAR) {
            Some(dir) => Self::in_dir(Path::new(&dir)),
            None => Self::default(),
        };
        if let Some(day) = var(DAY_PATH_VAR) {
            source.day = PathBuf::from(day);
        }
        if let Some(hour) = var(HOUR_PATH_VAR) {
            source.hour = PathBuf::from(hour);
        }
        source
    }
}
