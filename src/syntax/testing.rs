//! A parse engine that records what the orchestrator asks of it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tree_sitter::InputEdit;

use super::engine::ParseEngine;
use crate::error::{TreeCacheError, TreeCacheResult};

#[derive(Default)]
struct LogState {
    next_id: usize,
    parses: usize,
    released: Vec<usize>,
    edits: HashMap<usize, Vec<InputEdit>>,
    fail_marker: Option<String>,
}

/// Shared view of everything a [`RecordingEngine`] did.
#[derive(Clone, Default)]
pub(crate) struct EngineLog {
    state: Arc<Mutex<LogState>>,
}

impl EngineLog {
    /// Fail every parse whose text contains `marker`; empty clears it.
    pub(crate) fn fail_on(&self, marker: &str) {
        self.state.lock().unwrap().fail_marker =
            (!marker.is_empty()).then(|| marker.to_string());
    }

    pub(crate) fn parse_count(&self) -> usize {
        self.state.lock().unwrap().parses
    }

    pub(crate) fn created(&self) -> usize {
        self.state.lock().unwrap().next_id
    }

    pub(crate) fn released(&self) -> Vec<usize> {
        self.state.lock().unwrap().released.clone()
    }

    pub(crate) fn edits_for(&self, tree: usize) -> Vec<InputEdit> {
        self.state
            .lock()
            .unwrap()
            .edits
            .get(&tree)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn edits_applied_to(&self, tree: usize) -> usize {
        self.edits_for(tree).len()
    }
}

/// Tree handed out by [`RecordingEngine`]; reports its release on drop.
pub(crate) struct RecordingTree {
    pub(crate) id: usize,
    pub(crate) text: String,
    /// Tree passed as reuse hint when this one was parsed
    pub(crate) reused: Option<usize>,
    pub(crate) applied_edits: Vec<InputEdit>,
    log: EngineLog,
}

impl Drop for RecordingTree {
    fn drop(&mut self) {
        let mut state = self.log.state.lock().unwrap();
        assert!(
            !state.released.contains(&self.id),
            "tree {} released twice",
            self.id
        );
        state.released.push(self.id);
    }
}

pub(crate) struct RecordingEngine {
    log: EngineLog,
}

impl RecordingEngine {
    pub(crate) fn new() -> Self {
        Self {
            log: EngineLog::default(),
        }
    }

    pub(crate) fn log(&self) -> EngineLog {
        self.log.clone()
    }
}

impl ParseEngine for RecordingEngine {
    type Tree = RecordingTree;

    fn parse(
        &mut self,
        text: &str,
        previous: Option<&RecordingTree>,
    ) -> TreeCacheResult<RecordingTree> {
        let mut state = self.log.state.lock().unwrap();
        state.parses += 1;
        if let Some(marker) = &state.fail_marker
            && text.contains(marker.as_str())
        {
            return Err(TreeCacheError::parse(format!("refusing to parse {marker}")));
        }

        let id = state.next_id;
        state.next_id += 1;
        Ok(RecordingTree {
            id,
            text: text.to_string(),
            reused: previous.map(|tree| tree.id),
            applied_edits: Vec::new(),
            log: self.log.clone(),
        })
    }

    fn edit(&mut self, tree: &mut RecordingTree, edit: &InputEdit) -> TreeCacheResult<()> {
        tree.applied_edits.push(*edit);
        self.log
            .state
            .lock()
            .unwrap()
            .edits
            .entry(tree.id)
            .or_default()
            .push(*edit);
        Ok(())
    }
}
