use tree_sitter::{InputEdit, Language, Parser, Tree};

use crate::error::{TreeCacheError, TreeCacheResult};

/// Capability the orchestrator needs from a parsing engine.
///
/// Trees are released by dropping them; the orchestrator guarantees each tree
/// is dropped exactly once.
pub trait ParseEngine {
    type Tree;

    /// Parse `text`. With `previous`, the tree has already been adjusted by
    /// [`ParseEngine::edit`] and serves as a reuse hint.
    fn parse(&mut self, text: &str, previous: Option<&Self::Tree>) -> TreeCacheResult<Self::Tree>;

    /// Adjust the ranges of `tree` for one edit without reparsing.
    fn edit(&mut self, tree: &mut Self::Tree, edit: &InputEdit) -> TreeCacheResult<()>;
}

/// [`ParseEngine`] backed by a tree-sitter parser for one language.
pub struct TreeSitterEngine {
    parser: Parser,
    language: Language,
}

impl TreeSitterEngine {
    /// Create an engine parsing `language`
    pub fn new(language: Language) -> TreeCacheResult<Self> {
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        Ok(Self { parser, language })
    }

    /// Engine for the bundled Rust grammar
    pub fn rust() -> TreeCacheResult<Self> {
        Self::new(tree_sitter_rust::LANGUAGE.into())
    }

    pub fn language(&self) -> &Language {
        &self.language
    }
}

impl ParseEngine for TreeSitterEngine {
    type Tree = Tree;

    fn parse(&mut self, text: &str, previous: Option<&Tree>) -> TreeCacheResult<Tree> {
        match self.parser.parse(text, previous) {
            Some(tree) => Ok(tree),
            None => {
                // A failed parse can leave the parser mid-document
                self.parser.reset();
                Err(TreeCacheError::parse(format!(
                    "parser returned no tree for {} bytes of text",
                    text.len()
                )))
            }
        }
    }

    fn edit(&mut self, tree: &mut Tree, edit: &InputEdit) -> TreeCacheResult<()> {
        if edit.old_end_byte < edit.start_byte || edit.new_end_byte < edit.start_byte {
            return Err(TreeCacheError::parse(format!(
                "malformed edit {}..{} -> {}",
                edit.start_byte, edit.old_end_byte, edit.new_end_byte
            )));
        }
        tree.edit(edit);
        Ok(())
    }
}
