pub mod source;
pub mod store;

mod model;

// Re-export main types
pub use model::Document;
pub use source::{ChangeRange, ContentChange, DocumentChange, DocumentEvent, DocumentSource};
pub use store::{DocumentHandle, DocumentStore, TextEdit};
