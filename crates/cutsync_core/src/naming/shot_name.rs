//! Shot name resolution.
//!
//! A Shot name is derived from a clip by an ordered chain of strategies;
//! the first one returning a name wins:
//!
//! 1. [`MetadataStrategy`]: explicit Shot name, first marker word, EDL comments
//! 2. [`RegexStrategy`]: configured pattern applied to the clip name
//! 3. [`ClipNameStrategy`]: the clip name itself, when enabled

use regex::Regex;

use crate::config::ShotSettings;
use crate::models::TimelineClip;
use crate::reconcile::{ClipError, ConfigurationError};

/// One way of deriving a Shot name from a clip.
pub trait ShotNameStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Shot name for the clip, if this strategy can tell.
    fn resolve(&self, clip: &TimelineClip) -> Option<String>;
}

/// Shot name recorded on the clip itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataStrategy;

impl ShotNameStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn resolve(&self, clip: &TimelineClip) -> Option<String> {
        if let Some(name) = clip.metadata.shot_name.as_deref() {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
        if let Some(marker) = clip.markers.first() {
            if let Some(word) = marker.name.split_whitespace().next() {
                return Some(word.to_string());
            }
        }
        comment_shot_name(&clip.comments)
    }
}

/// Pick a Shot name from EDL comments.
///
/// `* COMMENT : NAME` lines win over bare `* NAME` lines; among bare lines
/// the first one wins.
fn comment_shot_name(comments: &[String]) -> Option<String> {
    let mut bare = None;
    for comment in comments {
        match parse_comment(comment) {
            Some((true, name)) => return Some(name.to_string()),
            Some((false, name)) if bare.is_none() => bare = Some(name.to_string()),
            _ => {}
        }
    }
    bare
}

/// Parse `[*] [COMMENT :] NAME`, returning whether the COMMENT keyword was
/// present. NAME must be a single `[A-Za-z0-9_-]+` word ending the line.
fn parse_comment(comment: &str) -> Option<(bool, &str)> {
    let rest = comment.strip_prefix('*').unwrap_or(comment);
    let (keyword, rest) = match rest.trim_start().strip_prefix("COMMENT") {
        Some(after) => match after.trim_start().strip_prefix(':') {
            Some(after_colon) => (true, after_colon),
            None => (false, rest),
        },
        None => (false, rest),
    };
    let name = rest.trim_start();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some((keyword, name))
}

/// Shot name extracted from the clip name by a regular expression.
///
/// The first capture group is used when the pattern has one, the whole
/// match otherwise.
#[derive(Debug, Clone)]
pub struct RegexStrategy {
    regex: Regex,
}

impl RegexStrategy {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }
}

impl ShotNameStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn resolve(&self, clip: &TimelineClip) -> Option<String> {
        let captures = self.regex.captures(&clip.name)?;
        let found = if captures.len() > 1 {
            captures.get(1)?
        } else {
            captures.get(0)?
        };
        let name = found.as_str().trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// The clip name used verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipNameStrategy;

impl ShotNameStrategy for ClipNameStrategy {
    fn name(&self) -> &'static str {
        "clip_name"
    }

    fn resolve(&self, clip: &TimelineClip) -> Option<String> {
        let name = clip.name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Ordered chain of Shot name strategies.
pub struct ShotNameResolver {
    strategies: Vec<Box<dyn ShotNameStrategy>>,
}

impl ShotNameResolver {
    /// Resolver with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Build the strategy chain configured by the Shot settings.
    pub fn from_settings(settings: &ShotSettings) -> Result<Self, ConfigurationError> {
        let mut resolver = Self::empty().with_strategy(MetadataStrategy);
        if let Some(regex) = settings.shot_regex()? {
            resolver = resolver.with_strategy(RegexStrategy::new(regex));
        }
        if settings.use_clip_names_for_shot_names {
            resolver = resolver.with_strategy(ClipNameStrategy);
        }
        Ok(resolver)
    }

    /// Append a strategy, tried after the existing ones.
    pub fn with_strategy(mut self, strategy: impl ShotNameStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve the Shot name of a clip.
    pub fn resolve(&self, clip: &TimelineClip) -> Result<String, ClipError> {
        for strategy in &self.strategies {
            if let Some(name) = strategy.resolve(clip) {
                tracing::trace!(
                    "Clip '{}' resolved to Shot '{}' by {}",
                    clip.name,
                    name,
                    strategy.name()
                );
                return Ok(name);
            }
        }
        Err(ClipError::unresolvable(&clip.name, clip.index))
    }
}

impl std::fmt::Debug for ShotNameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotNameResolver")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
