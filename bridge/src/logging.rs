//! Console logging, optionally mirrored to rolling files in a log directory.

use std::path::Path;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_SUFFIX: &str = "log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl FromStr for RotationPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minutely" => Ok(RotationPeriod::Minutely),
            "hourly" => Ok(RotationPeriod::Hourly),
            "daily" => Ok(RotationPeriod::Daily),
            "never" => Ok(RotationPeriod::Never),
            other => Err(format!(
                "unknown rotation '{other}', expected one of minutely, hourly, daily, never"
            )),
        }
    }
}

impl From<RotationPeriod> for Rotation {
    fn from(period: RotationPeriod) -> Self {
        match period {
            RotationPeriod::Minutely => Rotation::MINUTELY,
            RotationPeriod::Hourly => Rotation::HOURLY,
            RotationPeriod::Daily => Rotation::DAILY,
            RotationPeriod::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: String,
    pub log_prefix: String,
    pub rotation: RotationPeriod,
    /// 0 keeps every file.
    pub max_log_files: usize,
}

impl LogConfig {
    pub fn new(log_dir: impl Into<String>, rotation: RotationPeriod, max_log_files: usize) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_prefix: "led-foot-bridge".to_string(),
            rotation,
            max_log_files,
        }
    }
}

/// Flushes pending file logs when dropped; keep it alive for the whole run.
#[must_use]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber. Without a config only the console is used.
pub fn setup_logging(config: Option<LogConfig>) -> std::io::Result<LogGuard> {
    let Some(config) = config else {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(Layer::default().with_target(true))
            .init();
        return Ok(LogGuard { _file_guard: None });
    };

    let log_dir = Path::new(&config.log_dir);
    std::fs::create_dir_all(log_dir)?;
    if config.max_log_files > 0 {
        cleanup_old_logs(log_dir, &config.log_prefix, config.max_log_files)?;
    }

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.log_prefix)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_log_files)
        .build(log_dir)
        .map_err(std::io::Error::other)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = Layer::default()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .with(Layer::default().with_target(true))
        .init();

    Ok(LogGuard {
        _file_guard: Some(guard),
    })
}

/// Deletes the oldest `<prefix>*.log` files so at most `keep` remain.
fn cleanup_old_logs(log_dir: &Path, prefix: &str, keep: usize) -> std::io::Result<usize> {
    let mut files = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_name().to_str().is_some_and(|name| {
                name.starts_with(prefix) && name.ends_with(&format!(".{LOG_SUFFIX}"))
            })
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((entry.path(), modified))
        })
        .collect::<Vec<_>>();
    files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in files.into_iter().skip(keep) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to remove old log file {}: {e}", path.display()),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_parse_rotation() {
        assert_eq!("hourly".parse::<RotationPeriod>().unwrap(), RotationPeriod::Hourly);
        assert_eq!("NEVER".parse::<RotationPeriod>().unwrap(), RotationPeriod::Never);
        assert!("weekly".parse::<RotationPeriod>().is_err());
        assert_eq!(RotationPeriod::default(), RotationPeriod::Daily);
    }

    #[test]
    fn test_cleanup_keeps_newest_logs() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        for i in 0..4u64 {
            let file = File::create(dir.path().join(format!("led-foot-bridge.{i}.log"))).unwrap();
            file.set_modified(now - Duration::from_secs(60 * (4 - i)))
                .unwrap();
        }
        std::fs::write(dir.path().join("other.log"), "keep").unwrap();
        std::fs::write(dir.path().join("led-foot-bridge.txt"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), "led-foot-bridge", 2).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("led-foot-bridge.0.log").exists());
        assert!(!dir.path().join("led-foot-bridge.1.log").exists());
        assert!(dir.path().join("led-foot-bridge.2.log").exists());
        assert!(dir.path().join("led-foot-bridge.3.log").exists());
        assert!(dir.path().join("other.log").exists());
        assert!(dir.path().join("led-foot-bridge.txt").exists());
    }
}
