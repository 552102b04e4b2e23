//! Configuration for the request pipeline.

use serde::Deserialize;

use crate::domain::error::RequestError;

/// Pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Page size of list reads without `$first`.
    pub default_page_size: u32,

    /// Upper bound for `$first`; `$first=-1` selects it.
    pub max_page_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 100_000,
        }
    }
}

impl PipelineConfig {
    /// Resolve the requested page size of a list read.
    ///
    /// # Errors
    ///
    /// [`RequestError::InvalidPageSize`] for `0`, values below `-1`, or values above the maximum.
    pub fn page_size(&self, first: Option<i64>) -> Result<u32, RequestError> {
        match first {
            None => Ok(self.default_page_size.min(self.max_page_size)),
            Some(-1) => Ok(self.max_page_size),
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|n| *n > 0 && *n <= self.max_page_size)
                .ok_or(RequestError::InvalidPageSize(n)),
        }
    }
}
