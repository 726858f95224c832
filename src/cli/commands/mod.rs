pub mod patterns;
pub mod token;
pub mod verify;
