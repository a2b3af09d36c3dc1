pub mod matches;
pub mod structural;

pub use matches::{MatchRecord, QueryMatch, SourcePosition, SourceRange};
pub use structural::StructuralQuery;
