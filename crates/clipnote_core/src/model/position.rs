//! Last known widget placement.
//!
//! # Invariants
//! - `top` and `left` are CSS length strings (`12px`, `-3.5em`, `40%`) or `auto`.

use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CSS_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(auto|-?(\d+(\.\d+)?|\.\d+)(px|%|em|rem|vh|vw)|0)$")
        .expect("valid css length regex")
});

/// Persisted shape under `notePosition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub top: String,
    pub left: String,
}

impl Position {
    /// Builds a position from pixel offsets, as produced on drag release.
    pub fn from_pixels(top: i64, left: i64) -> Self {
        Self {
            top: format!("{top}px"),
            left: format!("{left}px"),
        }
    }

    /// Rejects values that are not CSS lengths.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [("top", &self.top), ("left", &self.left)] {
            if !is_css_length(value) {
                return Err(CoreError::InvalidPosition(format!(
                    "{field} `{value}` is not a css length"
                )));
            }
        }
        Ok(())
    }
}

pub fn is_css_length(value: &str) -> bool {
    CSS_LENGTH_RE.is_match(value.trim())
}

#[cfg(test)]
mod tests {
    use super::{is_css_length, Position};

    #[test]
    fn accepts_common_css_lengths() {
        for value in ["12px", "-4px", "0", "12.5%", ".5em", "auto", "3rem"] {
            assert!(is_css_length(value), "{value} should be accepted");
        }
    }

    #[test]
    fn rejects_non_lengths() {
        for value in ["", "px", "12", "12 px", "calc(1px)", "1e3px"] {
            assert!(!is_css_length(value), "{value} should be rejected");
        }
    }

    #[test]
    fn from_pixels_produces_valid_position() {
        let position = Position::from_pixels(120, -8);
        assert_eq!(position.top, "120px");
        assert_eq!(position.left, "-8px");
        position.validate().expect("pixel position should validate");
    }
}
