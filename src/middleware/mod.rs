pub mod auth;
pub mod response;

pub use auth::{invalidate_user_cache, optional_auth, require_auth, CurrentUser};
pub use response::{ApiResponse, ApiResult};
