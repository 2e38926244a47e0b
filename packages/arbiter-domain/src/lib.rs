pub mod query;

pub use query::{Query, QueryRejectReason, sanitize_query};
