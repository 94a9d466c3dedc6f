//! CLI command implementations.

pub(crate) mod allowed_html;
pub(crate) mod parsers;
pub(crate) mod render;
pub(crate) mod validate_version;

pub(crate) use allowed_html::AllowedHtmlArgs;
pub(crate) use parsers::ParsersArgs;
pub(crate) use render::RenderArgs;
pub(crate) use validate_version::ValidateVersionArgs;
