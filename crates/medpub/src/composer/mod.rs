//! Client-side article composition: a structured section document rendered
//! to Markdown, plus the catalogue of academic templates.

pub mod document;
pub mod export;
pub mod templates;

pub use document::{compose_markup, insert_into_template, ArticleDocument, SectionKind};
pub use export::render_export_html;
pub use templates::{Template, TemplateKey, DEFAULT_TONE, TEMPLATES, TONES};
