use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfoboxError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Snapshot error at {path}: {message}")]
    SnapshotError { path: String, message: String },
}

impl InfoboxError {
    /// True when the error is a file that does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InfoboxError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            InfoboxError::HttpError(_) => {
                "Could not reach the wiki API. Check the endpoint and your network.".to_string()
            }
            InfoboxError::IoError(e) => format!("A file could not be read or written: {}", e),
            InfoboxError::SerializationError(e) => {
                format!("A snapshot file is not valid JSON: {}", e)
            }
            InfoboxError::ConfigError { .. }
            | InfoboxError::ConfigValidationError { .. }
            | InfoboxError::InvalidConfigValueError { .. }
            | InfoboxError::MissingConfigError { .. } => format!("Invalid configuration: {}", self),
            InfoboxError::SnapshotError { path, message } => {
                format!("Snapshot {}: {}", path, message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            InfoboxError::HttpError(_) => "Retry later; pages already stored are kept",
            InfoboxError::IoError(_) => "Check permissions and free space in the data directory",
            InfoboxError::SerializationError(_) => {
                "Restore the snapshot from the archive folder or run `redownload`"
            }
            InfoboxError::SnapshotError { .. } => {
                "Run `update` to create missing snapshots, or rename the newest archived copy back into place"
            }
            _ => "Fix the configuration file or command line flags and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, InfoboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let missing = InfoboxError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert!(missing.is_not_found());

        let denied = InfoboxError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "nope",
        ));
        assert!(!denied.is_not_found());

        let config = InfoboxError::ConfigError {
            message: "bad".to_string(),
        };
        assert!(!config.is_not_found());
    }

    #[test]
    fn test_snapshot_error_message_names_the_file() {
        let err = InfoboxError::SnapshotError {
            path: "raw/chembox_raw_html.json".to_string(),
            message: "no raw snapshot to re-parse".to_string(),
        };

        assert_eq!(
            err.user_friendly_message(),
            "Snapshot raw/chembox_raw_html.json: no raw snapshot to re-parse"
        );
        assert!(err.recovery_suggestion().contains("update"));
    }
}
