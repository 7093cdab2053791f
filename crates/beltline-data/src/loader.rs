//! Reading configuration files: format detection, parsing, validation.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::schema::LineConfig;

// ===========================================================================
// Errors
// ===========================================================================

/// Configuration problems. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A required section is absent or empty.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {detail}")]
    Invalid { field: &'static str, detail: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, err: impl Display) -> Self {
        Self::Invalid {
            field,
            detail: err.to_string(),
        }
    }
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file from its extension (case-insensitive).
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Read, parse and validate a configuration file.
pub fn load_config(path: &Path) -> Result<LineConfig, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, format, path)?;
    tracing::info!(
        file = %path.display(),
        archetypes = config.archetypes.len(),
        paint_codes = config.paint.colors.len(),
        stations = config.stations.thresholds_m.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Parse and validate configuration text. `file` is only used in errors.
pub fn parse_config(content: &str, format: Format, file: &Path) -> Result<LineConfig, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    let config: LineConfig = match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect_format(Path::new("a/line.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("line.RON")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("line.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("line.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("line")).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn syntax_error_names_the_file() {
        let err = parse_config("[belt\nlength_m = ", Format::Toml, Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_has_no_archetypes() {
        let err = parse_config("", Format::Toml, Path::new("empty.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("archetypes")));
    }
}
