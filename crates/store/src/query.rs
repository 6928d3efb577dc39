use serde::{Deserialize, Serialize};

/// Skip/take pagination window for admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Number of rows to skip.
    pub skip: usize,

    /// Maximum number of rows to return.
    pub take: usize,
}

impl Page {
    pub const DEFAULT_TAKE: usize = 20;
    pub const MAX_TAKE: usize = 100;

    /// Creates a page window, capping `take` at [`Page::MAX_TAKE`].
    pub fn new(skip: usize, take: usize) -> Self {
        Self {
            skip,
            take: take.min(Self::MAX_TAKE),
        }
    }

    /// Builds a page from optional request parameters.
    pub fn from_params(skip: Option<usize>, take: Option<usize>) -> Self {
        Self::new(skip.unwrap_or(0), take.unwrap_or(Self::DEFAULT_TAKE))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_TAKE)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
}
