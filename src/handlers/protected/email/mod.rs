// Finder and verifier endpoints over the orchestrated provider stack.
pub mod bulk;
pub mod single;
pub mod verifier;

use serde::Deserialize;

use crate::error::ApiError;

/// Body shared by the finder endpoints. `last_name` may be absent; the
/// candidate generator copes with a missing last name.
#[derive(Debug, Deserialize)]
pub struct FinderRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub domain: String,
    pub count: Option<usize>,
}

impl FinderRequest {
    /// Trimmed parts, rejecting blank first name or domain with a 400.
    fn validated(&self) -> Result<(&str, &str, &str), ApiError> {
        let first = self.first_name.trim();
        let domain = self.domain.trim();
        if first.is_empty() {
            return Err(ApiError::bad_request("first_name must not be empty"));
        }
        if domain.is_empty() {
            return Err(ApiError::bad_request("domain must not be empty"));
        }
        Ok((first, self.last_name.trim(), domain))
    }
}
