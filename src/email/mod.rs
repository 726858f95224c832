// Email finding: candidate generation, provider clients, orchestration
pub mod orchestrator;
pub mod patterns;
pub mod providers;
pub mod types;

// Re-export core types
pub use orchestrator::{race_until_first_match, BatchReport, VerificationOrchestrator};
pub use patterns::{generate_candidates, search_fingerprint};
pub use types::*;
