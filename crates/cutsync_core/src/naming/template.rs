//! `{TOKEN}` template parsing shared by Version names and paths.
//!
//! Templates are parsed once, when a reconciler is built, so rendering can
//! not fail. Numeric tokens accept a width suffix: `{CLIP_INDEX:04d}` pads
//! with zeros, `{CLIP_INDEX:3}` pads with spaces.

use crate::reconcile::TemplateError;

/// Value substituted for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Text(String),
    Number(i64),
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        TokenValue::Text(value)
    }
}

/// Tokens a template kind understands.
#[derive(Debug, Clone, Copy)]
pub struct TokenSet {
    pub text: &'static [&'static str],
    /// Tokens accepting a width suffix.
    pub numeric: &'static [&'static str],
}

impl TokenSet {
    fn is_numeric(&self, token: &str) -> bool {
        self.numeric.contains(&token)
    }

    fn contains(&self, token: &str) -> bool {
        self.text.contains(&token) || self.is_numeric(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Width {
    digits: usize,
    zero_pad: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token { name: String, width: Option<Width> },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting tokens outside `tokens`.
    pub fn parse(source: &str, tokens: &TokenSet) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (inner_offset, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::unbalanced(source, inner_offset)),
                            other => body.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::unbalanced(source, offset));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_token(source, &body, tokens)?);
                }
                '}' => return Err(TemplateError::unbalanced(source, offset)),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template references a token.
    pub fn uses(&self, token: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Token { name, .. } if name == token))
    }

    /// Substitute every token with the value returned by `value`.
    pub fn render<F>(&self, mut value: F) -> String
    where
        F: FnMut(&str) -> TokenValue,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token { name, width } => match (value(name), width) {
                    (TokenValue::Number(n), Some(w)) if w.zero_pad => {
                        out.push_str(&format!("{:0width$}", n, width = w.digits))
                    }
                    (TokenValue::Number(n), Some(w)) => {
                        out.push_str(&format!("{:>width$}", n, width = w.digits))
                    }
                    (TokenValue::Number(n), None) => out.push_str(&n.to_string()),
                    (TokenValue::Text(text), _) => out.push_str(&text),
                },
            }
        }
        out
    }
}

fn parse_token(source: &str, body: &str, tokens: &TokenSet) -> Result<Segment, TemplateError> {
    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec.trim())),
        None => (body.trim(), None),
    };
    if !tokens.contains(name) {
        return Err(TemplateError::unknown_token(name, source));
    }
    let width = match spec {
        None => None,
        Some(spec) => {
            if !tokens.is_numeric(name) {
                return Err(invalid_format(name, spec));
            }
            Some(parse_width(spec).ok_or_else(|| invalid_format(name, spec))?)
        }
    };
    Ok(Segment::Token {
        name: name.to_string(),
        width,
    })
}

fn invalid_format(token: &str, spec: &str) -> TemplateError {
    TemplateError::InvalidFormat {
        token: token.to_string(),
        spec: spec.to_string(),
    }
}

/// Parse `04d`, `04`, `3d` or `3`.
fn parse_width(spec: &str) -> Option<Width> {
    let digits = spec.strip_suffix('d').unwrap_or(spec);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(Width {
        digits: digits.parse().ok()?,
        zero_pad: digits.starts_with('0'),
    })
}
