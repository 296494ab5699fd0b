//! Version and cut item names.

use std::collections::HashSet;

use rand::Rng;

use super::template::{Template, TokenSet, TokenValue};
use crate::reconcile::TemplateError;

/// Tokens understood by Version name templates.
pub const VERSION_NAME_TOKENS: TokenSet = TokenSet {
    text: &["CLIP_NAME", "CUT_ITEM_NAME", "SHOT", "UUID"],
    numeric: &["CLIP_INDEX"],
};

/// Values available to a Version name template for one clip.
#[derive(Debug, Clone, Copy)]
pub struct VersionNameContext<'a> {
    pub clip_name: &'a str,
    pub cut_item_name: &'a str,
    pub shot: Option<&'a str>,
    /// 1-based clip index, gaps excluded.
    pub clip_index: usize,
}

/// Six hexadecimal digits, unique enough to tell Versions apart.
pub fn uuid_token<R: Rng>(rng: &mut R) -> String {
    format!("{:06x}", rng.gen_range(0..0x0100_0000u32))
}

/// Renders Version names from a template.
#[derive(Debug, Clone)]
pub struct VersionNamer {
    template: Template,
}

impl VersionNamer {
    /// Default template.
    pub const DEFAULT_TEMPLATE: &'static str = "{CLIP_NAME}_{UUID}";

    /// Parse a Version name template.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            template: Template::parse(template, &VERSION_NAME_TOKENS)?,
        })
    }

    pub fn template(&self) -> &str {
        self.template.source()
    }

    /// Name a Version. A fresh `UUID` is drawn for every occurrence.
    ///
    /// # Examples
    /// ```
    /// use cutsync_core::naming::{VersionNameContext, VersionNamer};
    ///
    /// let namer = VersionNamer::new("{SHOT}_{CLIP_INDEX:03d}").unwrap();
    /// let ctx = VersionNameContext {
    ///     clip_name: "A001C003",
    ///     cut_item_name: "A001C003",
    ///     shot: Some("SH010"),
    ///     clip_index: 4,
    /// };
    /// assert_eq!(namer.name(&ctx, &mut rand::thread_rng()), "SH010_004");
    /// ```
    pub fn name<R: Rng>(&self, ctx: &VersionNameContext<'_>, rng: &mut R) -> String {
        self.template.render(|token| match token {
            "CLIP_NAME" => ctx.clip_name.into(),
            "CUT_ITEM_NAME" => ctx.cut_item_name.into(),
            "SHOT" => ctx.shot.unwrap_or_default().into(),
            "CLIP_INDEX" => TokenValue::Number(ctx.clip_index as i64),
            _ => uuid_token(rng).into(),
        })
    }
}

/// Hands out unique cut item names within one Cut.
///
/// The first clip keeps its name; later clips with the same name get
/// `_001`, `_002`... suffixes.
#[derive(Debug, Clone, Default)]
pub struct CutItemNames {
    used: HashSet<String>,
}

impl CutItemNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique name for the next clip named `clip_name`.
    pub fn next_name(&mut self, clip_name: &str) -> String {
        let mut name = clip_name.to_string();
        let mut suffix = 0;
        while self.used.contains(&name) {
            suffix += 1;
            name = format!("{}_{:03}", clip_name, suffix);
        }
        self.used.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn ctx<'a>(clip_name: &'a str, index: usize) -> VersionNameContext<'a> {
        VersionNameContext {
            clip_name,
            cut_item_name: clip_name,
            shot: None,
            clip_index: index,
        }
    }

    #[test]
    fn cut_item_names_are_deduplicated() {
        let mut names = CutItemNames::new();
        assert_eq!(names.next_name("clip1"), "clip1");
        assert_eq!(names.next_name("clip1"), "clip1_001");
        assert_eq!(names.next_name("clip2"), "clip2");
        assert_eq!(names.next_name("clip1"), "clip1_002");
    }

    #[test]
    fn dedup_skips_names_already_taken() {
        let mut names = CutItemNames::new();
        assert_eq!(names.next_name("clip1_001"), "clip1_001");
        assert_eq!(names.next_name("clip1"), "clip1");
        assert_eq!(names.next_name("clip1"), "clip1_002");
    }

    #[test]
    fn default_template_appends_uuid() {
        let namer = VersionNamer::new(VersionNamer::DEFAULT_TEMPLATE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let name = namer.name(&ctx("A001", 1), &mut rng);
        let (clip, uuid) = name.split_once('_').unwrap();
        assert_eq!(clip, "A001");
        assert_eq!(uuid.len(), 6);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn seeded_rng_gives_stable_names() {
        let namer = VersionNamer::new("{CLIP_NAME}_{UUID}").unwrap();
        let a = namer.name(&ctx("A001", 1), &mut StdRng::seed_from_u64(42));
        let b = namer.name(&ctx("A001", 1), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn clip_index_is_per_occurrence() {
        let namer = VersionNamer::new("{CUT_ITEM_NAME}_{CLIP_INDEX:04d}").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx2 = ctx("clip1", 2);
        ctx2.cut_item_name = "clip1_001";
        assert_eq!(namer.name(&ctx("clip1", 1), &mut rng), "clip1_0001");
        assert_eq!(namer.name(&ctx2, &mut rng), "clip1_001_0002");
    }

    #[test]
    fn rejects_path_tokens() {
        assert_eq!(
            VersionNamer::new("{PROJECT}_{UUID}").unwrap_err(),
            TemplateError::unknown_token("PROJECT", "{PROJECT}_{UUID}")
        );
    }
}
