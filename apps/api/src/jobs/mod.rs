// Job postings: search, description fetch and description formatting.

pub mod fetch;
pub mod formatter;
pub mod handlers;
pub mod search;
