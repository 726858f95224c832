// Business logic layered over the stores. Handlers stay thin and call
// into these services.
pub mod chat;
pub mod credits;
pub mod exports;
pub mod finder;
pub mod usage;

pub use chat::{ChatAnswer, ChatMessage, ChatRequest, ChatService};
pub use credits::{CreditService, CreditSummary};
pub use exports::{ExportError, ExportHandle, ExportService};
pub use finder::{
    FinderSearchReport, FinderService, SequentialAnswer, SingleLookupAnswer,
};
pub use usage::{Feature, FeatureUsageReport, UsageDecision, UsageService};
