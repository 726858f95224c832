// Endpoints reachable without a JWT. The marketing page fetch runs behind
// optional_auth so logged-in visitors still get their role applied.
pub mod auth;
pub mod exports;
pub mod pages;
pub mod system;
