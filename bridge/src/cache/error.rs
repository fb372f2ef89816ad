//! Adapted from the teacher's `cache/error.rs`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache error: {0}")]
    Other(String),
}
