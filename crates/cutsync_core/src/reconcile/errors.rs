//! Error types for the reconciliation pass.
//!
//! Errors are split by blast radius:
//! Pass (configuration, template) → aborts immediately
//! Clip (unresolvable shot name, bad range) → collected in the plan
//! Warning (media unavailable, missing status history) → collected in the plan

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timecode::TimecodeError;

/// Top-level error aborting a whole reconciliation pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// Settings cannot drive a pass.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A name or path template is invalid.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Malformed settings or inputs that invalidate every computation of a pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Mapping mode is not 0, 1 or 2.
    #[error("Unknown timecode to frame mapping mode {0} (expected 0, 1 or 2)")]
    UnknownMappingMode(u8),

    /// Relative mapping anchor pair cannot be used.
    #[error("Invalid relative timecode mapping ('{timecode}', {frame}): {message}")]
    InvalidAnchor {
        timecode: String,
        frame: i64,
        message: String,
    },

    /// A timecode mapping needs a frame rate the timeline does not provide.
    #[error("Frame rate is unknown for clip '{clip}', cannot map its timecode")]
    UnknownFrameRate { clip: String },

    /// Clip timecode could not be converted.
    #[error("Timecode conversion failed for clip '{clip}': {source}")]
    Timecode {
        clip: String,
        #[source]
        source: TimecodeError,
    },

    /// Shot name regular expression does not compile.
    #[error("Invalid shot name regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Shot cut fields prefix cannot form field names.
    #[error("Invalid shot cut fields prefix '{0}'")]
    InvalidFieldsPrefix(String),

    /// Any other invalid setting value.
    #[error("Invalid setting '{name}': {message}")]
    InvalidSetting { name: String, message: String },
}

impl ConfigurationError {
    /// Create an invalid anchor error.
    pub fn invalid_anchor(
        timecode: impl Into<String>,
        frame: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAnchor {
            timecode: timecode.into(),
            frame,
            message: message.into(),
        }
    }

    /// Create an unknown frame rate error.
    pub fn unknown_frame_rate(clip: impl Into<String>) -> Self {
        Self::UnknownFrameRate { clip: clip.into() }
    }

    /// Create a timecode conversion error.
    pub fn timecode(clip: impl Into<String>, source: TimecodeError) -> Self {
        Self::Timecode {
            clip: clip.into(),
            source,
        }
    }

    /// Create an invalid regex error.
    pub fn invalid_regex(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid setting error.
    pub fn invalid_setting(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Invalid Version name or path template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// Token is not supported by this template kind.
    #[error("Unknown token '{{{token}}}' in template '{template}'")]
    UnknownToken { token: String, template: String },

    /// An opening or closing brace has no counterpart.
    #[error("Unbalanced brace at offset {offset} in template '{template}'")]
    UnbalancedBrace { template: String, offset: usize },

    /// Format suffix is not a width specification.
    #[error("Invalid format '{spec}' for token '{token}'")]
    InvalidFormat { token: String, spec: String },
}

impl TemplateError {
    /// Create an unknown token error.
    pub fn unknown_token(token: impl Into<String>, template: impl Into<String>) -> Self {
        Self::UnknownToken {
            token: token.into(),
            template: template.into(),
        }
    }

    /// Create an unbalanced brace error.
    pub fn unbalanced(template: impl Into<String>, offset: usize) -> Self {
        Self::UnbalancedBrace {
            template: template.into(),
            offset,
        }
    }
}

/// Error fatal for one clip only; the pass continues with the other clips.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipError {
    /// No strategy could derive a Shot name.
    #[error("Cannot resolve a Shot name for clip '{clip}' (#{index})")]
    UnresolvableShotName { clip: String, index: usize },

    /// Source range is empty or inverted.
    #[error("Clip '{clip}' (#{index}) has an empty source range {source_in}-{source_out}")]
    EmptySourceRange {
        clip: String,
        index: usize,
        source_in: i64,
        source_out: i64,
    },
}

impl ClipError {
    /// Create an unresolvable shot name error.
    pub fn unresolvable(clip: impl Into<String>, index: usize) -> Self {
        Self::UnresolvableShotName {
            clip: clip.into(),
            index,
        }
    }

    /// Timeline index of the offending clip.
    pub fn index(&self) -> usize {
        match self {
            Self::UnresolvableShotName { index, .. } | Self::EmptySourceRange { index, .. } => {
                *index
            }
        }
    }
}

/// Recoverable condition reported alongside the plan.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipWarning {
    /// Media could not be probed; the clip proceeds without a new Version.
    #[error("Media for clip '{clip}' (#{index}) is unavailable: {reason}")]
    MediaUnavailable {
        clip: String,
        index: usize,
        reason: String,
    },

    /// Reinstating to the previous status needs a recorded status.
    #[error("No status recorded before Shot '{shot}' was omitted, leaving status '{status}'")]
    MissingPreviousStatus { shot: String, status: String },

    /// Cut range exceeds the media covered by the Shot handles.
    #[error("Shot '{shot}' needs a rescan: {reason}")]
    NeedsRescan { shot: String, reason: String },
}

/// Result type for reconciliation passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
