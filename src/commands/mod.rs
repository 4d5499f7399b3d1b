pub mod accounts;
pub mod acquire;
pub mod completions;
pub mod handlers;
pub mod resolve;
pub mod search;
