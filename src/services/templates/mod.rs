//! Email templates: lookup and placeholder substitution.

mod resolver;
mod substitution;

pub use resolver::{
    BlobTemplateStore, CachedTemplateStore, DEFAULT_TEMPLATE_CONTENT_TYPE, ResolvedTemplate,
    TemplateResolver, TemplateStore,
};
pub use substitution::{Placeholders, SubstitutionResult, substitute};
