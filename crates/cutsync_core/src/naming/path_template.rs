//! Publish path templates for new Versions.

use chrono::NaiveDateTime;

use super::template::{Template, TokenSet};
use crate::reconcile::TemplateError;

/// Tokens understood by path templates.
pub const PATH_TOKENS: TokenSet = TokenSet {
    text: &[
        "PROJECT", "CUT_TITLE", "LINK", "SHOT", "HH", "DD", "MM", "YY", "YYYY",
    ],
    numeric: &[],
};

/// Values available to a path template.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    pub project: &'a str,
    pub cut_title: &'a str,
    /// Entity the Cut is linked to, or the project.
    pub link: &'a str,
    pub shot: Option<&'a str>,
    /// Date and time of the reconciliation pass.
    pub now: NaiveDateTime,
}

/// Renders the directory new Versions are published to.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: Template,
}

impl PathTemplate {
    /// Default template.
    pub const DEFAULT_TEMPLATE: &'static str = "{PROJECT}/{LINK}/{YYYY}{MM}{DD}/cuts";

    /// Parse a path template.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            template: Template::parse(template, &PATH_TOKENS)?,
        })
    }

    pub fn template(&self) -> &str {
        self.template.source()
    }

    /// Render the publish directory.
    pub fn render(&self, ctx: &PathContext<'_>) -> String {
        self.template.render(|token| {
            match token {
                "PROJECT" => ctx.project.to_string(),
                "CUT_TITLE" => ctx.cut_title.to_string(),
                "LINK" => ctx.link.to_string(),
                "SHOT" => ctx.shot.unwrap_or_default().to_string(),
                "HH" => ctx.now.format("%H").to_string(),
                "DD" => ctx.now.format("%d").to_string(),
                "MM" => ctx.now.format("%m").to_string(),
                "YY" => ctx.now.format("%y").to_string(),
                _ => ctx.now.format("%Y").to_string(),
            }
            .into()
        })
    }

    /// Full publish path of a Version, relative to the local storage.
    pub fn version_path(&self, ctx: &PathContext<'_>, version_name: &str) -> String {
        let dir = self.render(ctx);
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{}.mov", version_name)
        } else {
            format!("{}/{}.mov", dir, version_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn ctx() -> PathContext<'static> {
        PathContext {
            project: "demo",
            cut_title: "reel_1",
            link: "seq_01",
            shot: Some("SH010"),
            now: NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    #[test]
    fn default_template_renders_date() {
        let template = PathTemplate::new(PathTemplate::DEFAULT_TEMPLATE).unwrap();
        assert_eq!(template.render(&ctx()), "demo/seq_01/20240307/cuts");
    }

    #[test]
    fn all_tokens_render() {
        let template = PathTemplate::new("{CUT_TITLE}/{SHOT}/{YY}-{MM}-{DD}_{HH}").unwrap();
        assert_eq!(template.render(&ctx()), "reel_1/SH010/24-03-07_09");
    }

    #[test]
    fn version_path_appends_name() {
        let template = PathTemplate::new("{PROJECT}/cuts/").unwrap();
        assert_eq!(
            template.version_path(&ctx(), "A001_abc123"),
            "demo/cuts/A001_abc123.mov"
        );
    }

    #[test]
    fn rejects_version_tokens() {
        assert!(PathTemplate::new("{PROJECT}/{UUID}").is_err());
    }
}
