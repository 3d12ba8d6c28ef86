//! Built-in tools implemented against third-party HTTP services

pub mod email;
pub mod search;

pub use email::SendEmailTool;
pub use search::WebSearchTool;
