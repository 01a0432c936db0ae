//! Watch configuration
//!
//! Loaded once at startup from a JSON file. Missing fields take the defaults
//! below.
//!
//! | field | default | effect |
//! |-------|---------|--------|
//! | watch_folder | - | folder polled for matching files |
//! | printer_name | "" | target printer, empty = OS default |
//! | check_interval_seconds | 1 | poll period |
//! | delete_after_print | false | remove file after the post-action delay |
//! | move_after_print | true | move file into `printed_folder`, wins over delete |
//! | printed_folder | "printed" | subfolder of `watch_folder` |
//! | file_extensions | [".pdf"] | case-insensitive suffix filter |
//! | print_delay_seconds | 2 | extra wait after the file is ready |
//! | move_delete_delay_seconds | 60 | wait after dispatch before the post-action |
//! | print_method | "acrobat" | `acrobat` or `shellexecute` |
//! | acrobat_path | "" | viewer executable, auto-detected when empty |
//! | stability_checks | 2 | unchanged samples required before a file is ready |
//! | ready_timeout_seconds | 30 | give up on a file that never settles |
//! | viewer_timeout_seconds | 10 | bounded wait on the viewer process |
//! | viewer_lingers | true | a viewer still open at the timeout counts as submitted |

use crate::error::{ConfigError, ConfigResult};
use crate::post_action::PostAction;
use hotfolder_printer::{PrintMethod, ViewerOptions};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Upper bound for every duration field (one year)
pub const MAX_DURATION_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub watch_folder: PathBuf,
    pub printer_name: String,
    pub check_interval_seconds: f64,
    pub delete_after_print: bool,
    pub move_after_print: bool,
    pub printed_folder: String,
    pub file_extensions: Vec<String>,
    pub print_delay_seconds: f64,
    pub move_delete_delay_seconds: f64,
    pub print_method: PrintMethod,
    pub acrobat_path: String,
    pub stability_checks: u32,
    pub ready_timeout_seconds: f64,
    pub viewer_timeout_seconds: f64,
    pub viewer_lingers: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch_folder: PathBuf::new(),
            printer_name: String::new(),
            check_interval_seconds: 1.0,
            delete_after_print: false,
            move_after_print: true,
            printed_folder: "printed".to_string(),
            file_extensions: vec![".pdf".to_string()],
            print_delay_seconds: 2.0,
            move_delete_delay_seconds: 60.0,
            print_method: PrintMethod::Acrobat,
            acrobat_path: String::new(),
            stability_checks: 2,
            ready_timeout_seconds: 30.0,
            viewer_timeout_seconds: 10.0,
            viewer_lingers: true,
        }
    }
}

impl WatchConfig {
    /// Load, normalise and validate the config file
    ///
    /// A missing file is replaced by a template and reported as
    /// [`ConfigError::NotFound`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::write_template(path)?;
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        if let Ok(folder) = std::path::absolute(&config.watch_folder) {
            config.watch_folder = folder;
        }

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and normalise without touching the filesystem
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.normalize();
        Ok(config)
    }

    fn write_template(path: &Path) -> ConfigResult<()> {
        let template = Self {
            watch_folder: PathBuf::from(if cfg!(windows) {
                r"C:\Sync\PDFs"
            } else {
                "/srv/hotfolder"
            }),
            ..Self::default()
        };
        let body = serde_json::to_string_pretty(&template).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, body).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        warn!(path = %path.display(), "Default configuration created");
        Ok(())
    }

    /// Lowercase extensions with a leading dot
    fn normalize(&mut self) {
        self.file_extensions = self
            .file_extensions
            .iter()
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();
        self.printer_name = self.printer_name.trim().to_string();
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.watch_folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("watch_folder is not set".into()));
        }
        if !self.watch_folder.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "watch_folder does not exist: {}",
                self.watch_folder.display()
            )));
        }

        for (name, value) in [
            ("check_interval_seconds", self.check_interval_seconds),
            ("print_delay_seconds", self.print_delay_seconds),
            ("move_delete_delay_seconds", self.move_delete_delay_seconds),
            ("ready_timeout_seconds", self.ready_timeout_seconds),
            ("viewer_timeout_seconds", self.viewer_timeout_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
            if value > MAX_DURATION_SECONDS {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at most {} seconds, got {}",
                    name, MAX_DURATION_SECONDS, value
                )));
            }
        }
        if self.check_interval_seconds == 0.0 {
            return Err(ConfigError::Invalid(
                "check_interval_seconds must be greater than zero".into(),
            ));
        }
        if self.stability_checks == 0 {
            return Err(ConfigError::Invalid(
                "stability_checks must be at least 1".into(),
            ));
        }
        // A file is ready no sooner than `stability_checks` polls after discovery
        let window = f64::from(self.stability_checks) * self.check_interval_seconds;
        if self.ready_timeout_seconds <= window {
            return Err(ConfigError::Invalid(format!(
                "ready_timeout_seconds must exceed stability_checks x check_interval_seconds ({}), got {}",
                window, self.ready_timeout_seconds
            )));
        }
        if self.file_extensions.is_empty() {
            return Err(ConfigError::Invalid("file_extensions is empty".into()));
        }

        let mut components = Path::new(&self.printed_folder).components();
        if self.move_after_print
            && !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        {
            return Err(ConfigError::Invalid(format!(
                "printed_folder must be a plain folder name, got {:?}",
                self.printed_folder
            )));
        }

        if self.printer_name.is_empty() {
            warn!("No printer configured, the default printer will be used");
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        seconds(self.check_interval_seconds)
    }

    pub fn print_delay(&self) -> Duration {
        seconds(self.print_delay_seconds)
    }

    pub fn post_action_delay(&self) -> Duration {
        seconds(self.move_delete_delay_seconds)
    }

    pub fn ready_timeout(&self) -> Duration {
        seconds(self.ready_timeout_seconds)
    }

    /// Printer name, `None` for the default printer
    pub fn printer(&self) -> Option<&str> {
        (!self.printer_name.is_empty()).then_some(self.printer_name.as_str())
    }

    pub fn printed_dir(&self) -> PathBuf {
        self.watch_folder.join(&self.printed_folder)
    }

    /// Move takes precedence over delete
    pub fn post_action(&self) -> PostAction {
        match (self.move_after_print, self.delete_after_print) {
            (true, _) => PostAction::Move(self.printed_dir()),
            (false, true) => PostAction::Delete,
            (false, false) => PostAction::Leave,
        }
    }

    pub fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            executable: (!self.acrobat_path.trim().is_empty())
                .then(|| PathBuf::from(self.acrobat_path.trim())),
            timeout: seconds(self.viewer_timeout_seconds),
            lingers: self.viewer_lingers,
        }
    }

    /// Case-insensitive extension match on the file name
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_lowercase();
        self.file_extensions.iter().any(|ext| name.ends_with(ext))
    }

    /// Log the effective configuration
    pub fn log_summary(&self) {
        info!(folder = %self.watch_folder.display(), "Watch folder");
        info!(printer = self.printer().unwrap_or("(default)"), "Printer");
        info!(extensions = ?self.file_extensions, "File types");
        info!(method = ?self.print_method, post_action = %self.post_action(), "Print settings");
        info!(
            interval = ?self.check_interval(),
            print_delay = ?self.print_delay(),
            post_action_delay = ?self.post_action_delay(),
            "Timing"
        );
    }
}

/// Clamped into `0..=MAX_DURATION_SECONDS`, zero when not a number
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_DURATION_SECONDS)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path, extra: &str) -> String {
        format!(
            r#"{{ "watch_folder": {} {} }}"#,
            serde_json::to_string(dir).unwrap(),
            extra
        )
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::from_json(&config_in(dir.path(), "")).unwrap();
        assert_eq!(config.check_interval(), Duration::from_secs(1));
        assert_eq!(config.print_delay(), Duration::from_secs(2));
        assert_eq!(config.post_action_delay(), Duration::from_secs(60));
        assert_eq!(config.print_method, PrintMethod::Acrobat);
        assert_eq!(config.file_extensions, vec![".pdf"]);
        assert_eq!(config.printer(), None);
        config.validate().unwrap();
    }

    #[test]
    fn test_extensions_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::from_json(&config_in(
            dir.path(),
            r#", "file_extensions": ["PDF", ".Ps", " "]"#,
        ))
        .unwrap();
        assert_eq!(config.file_extensions, vec![".pdf", ".ps"]);
        assert!(config.matches_extension(Path::new("/x/Invoice.PDF")));
        assert!(config.matches_extension(Path::new("/x/a.ps")));
        assert!(!config.matches_extension(Path::new("/x/a.pdf.part")));
        assert!(!config.matches_extension(Path::new("/x/pdf")));
    }

    #[test]
    fn test_unknown_print_method_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = WatchConfig::from_json(&config_in(dir.path(), r#", "print_method": "lpr""#));
        assert!(result.is_err());
    }

    #[test]
    fn test_move_wins_over_delete() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::from_json(&config_in(
            dir.path(),
            r#", "move_after_print": true, "delete_after_print": true"#,
        ))
        .unwrap();
        assert_eq!(config.post_action(), PostAction::Move(dir.path().join("printed")));

        let config = WatchConfig::from_json(&config_in(
            dir.path(),
            r#", "move_after_print": false, "delete_after_print": true"#,
        ))
        .unwrap();
        assert_eq!(config.post_action(), PostAction::Delete);
    }

    #[test]
    fn test_validation_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            r#", "check_interval_seconds": 0"#,
            r#", "print_delay_seconds": -1"#,
            r#", "stability_checks": 0"#,
            r#", "file_extensions": []"#,
            r#", "printed_folder": "../elsewhere""#,
            r#", "move_delete_delay_seconds": 1e19"#,
            r#", "check_interval_seconds": 1e20"#,
            r#", "print_delay_seconds": 31536001"#,
            r#", "viewer_timeout_seconds": 1e300"#,
            r#", "ready_timeout_seconds": 0"#,
            r#", "ready_timeout_seconds": 2"#,
            r#", "check_interval_seconds": 5, "stability_checks": 3, "ready_timeout_seconds": 15"#,
        ];
        for extra in cases {
            let config = WatchConfig::from_json(&config_in(dir.path(), extra)).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "expected invalid: {}",
                extra
            );
        }

        let missing = WatchConfig {
            watch_folder: dir.path().join("missing"),
            ..WatchConfig::default()
        };
        assert!(matches!(missing.validate(), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            WatchConfig::default().validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_ready_timeout_covering_stability_window_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::from_json(&config_in(
            dir.path(),
            r#", "check_interval_seconds": 5, "stability_checks": 3, "ready_timeout_seconds": 16"#,
        ))
        .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_out_of_range_durations_do_not_panic() {
        let config = WatchConfig {
            check_interval_seconds: 1e20,
            move_delete_delay_seconds: 1e19,
            print_delay_seconds: f64::NAN,
            ready_timeout_seconds: -4.0,
            ..WatchConfig::default()
        };
        let cap = Duration::from_secs_f64(MAX_DURATION_SECONDS);
        assert_eq!(config.check_interval(), cap);
        assert_eq!(config.post_action_delay(), cap);
        assert_eq!(config.print_delay(), Duration::ZERO);
        assert_eq!(config.ready_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_viewer_options() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::from_json(&config_in(
            dir.path(),
            r#", "acrobat_path": "  ", "viewer_timeout_seconds": 3, "viewer_lingers": false"#,
        ))
        .unwrap();
        let options = config.viewer_options();
        assert_eq!(options.executable, None);
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert!(!options.lingers);
    }
}
