pub mod activity;
pub mod page;
pub mod user;

pub use activity::*;
pub use page::*;
pub use user::*;
