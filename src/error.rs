//! Structured error types for the ScribbleCraft engine.
//!
//! Most of these never reach the end user: the exporters swallow them and
//! log a warning, because a failed preview or export is a no-op rather than
//! an error dialog. They exist so the lower layers can still use `?`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScribeError>;

/// The unified error type returned by fallible ScribbleCraft functions.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// The export request JSON failed to parse.
    #[error("Failed to parse export request: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A font could not be decoded or parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// A raster surface of the requested size could not be allocated.
    #[error("Surface unavailable: cannot allocate {width}x{height} pixels")]
    SurfaceUnavailable { width: u32, height: u32 },

    /// PNG or PDF encoding failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writing an artifact to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ScribeError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the export request schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "The request ended early. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ScribeError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: ScribeError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse export request"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_surface_unavailable_message() {
        let err = ScribeError::SurfaceUnavailable {
            width: 0,
            height: 10,
        };
        assert_eq!(
            err.to_string(),
            "Surface unavailable: cannot allocate 0x10 pixels"
        );
    }
}
