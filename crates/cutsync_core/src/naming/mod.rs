//! Name derivation: Shot names from clips, Version names and publish paths
//! from templates.

mod path_template;
mod shot_name;
mod template;
mod version_name;

pub use path_template::{PathContext, PathTemplate, PATH_TOKENS};
pub use shot_name::{
    ClipNameStrategy, MetadataStrategy, RegexStrategy, ShotNameResolver, ShotNameStrategy,
};
pub use template::{Template, TokenSet, TokenValue};
pub use version_name::{
    uuid_token, CutItemNames, VersionNameContext, VersionNamer, VERSION_NAME_TOKENS,
};
