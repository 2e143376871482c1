//! Translation of engine edits back into host documents.

pub mod translator;

pub use translator::{EditOrigin, EditTranslator, HostEdit, HostEdits};
