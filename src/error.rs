//! Error handling types for tree-cache
//!
//! This module provides the error type shared by the parse engine, the query
//! engine and the configuration loader.

use thiserror::Error;

/// Comprehensive error type for tree cache operations
#[derive(Debug, Error)]
pub enum TreeCacheError {
    /// The grammar could not be installed into a parser
    #[error("Language error: {message}")]
    Language { message: String },

    /// The parsing engine failed to produce or update a tree
    #[error("Parse failed: {message}")]
    Parse { message: String },

    /// Query compilation or execution failed
    #[error("Query error: {message}")]
    Query { message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tree cache operations
pub type TreeCacheResult<T> = Result<T, TreeCacheError>;

/// Helper functions for common error patterns
impl TreeCacheError {
    /// Create a language error
    pub fn language(message: impl Into<String>) -> Self {
        TreeCacheError::Language {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        TreeCacheError::Parse {
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        TreeCacheError::Query {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        TreeCacheError::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        TreeCacheError::Internal(message.into())
    }
}

impl From<tree_sitter::LanguageError> for TreeCacheError {
    fn from(err: tree_sitter::LanguageError) -> Self {
        TreeCacheError::language(err.to_string())
    }
}

impl From<tree_sitter::QueryError> for TreeCacheError {
    fn from(err: tree_sitter::QueryError) -> Self {
        TreeCacheError::query(err.to_string())
    }
}
