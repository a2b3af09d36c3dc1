pub mod engine;
pub mod events;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use engine::{ParseEngine, TreeSitterEngine};
pub use events::{ListenerId, ParseCompleted, ParseKind};
pub use orchestrator::{CacheStats, ParseOrchestrator, TreeRef};
