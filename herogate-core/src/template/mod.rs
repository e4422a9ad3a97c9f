//! Deployment template handling.
//!
//! The stack template is fetched whole, parsed into a typed tree, mutated in place
//! and written back whole.

pub mod container;
pub mod document;
pub mod mutator;
pub mod node;
pub mod path;
pub mod procfile;
pub mod service;

pub use document::TemplateDocument;
pub use mutator::{EnvVar, TemplateMutator};
pub use node::{Node, Scalar};
pub use path::{NodePath, Segment};
pub use procfile::{ProcessSpec, Procfile};
pub use service::TemplateManager;
