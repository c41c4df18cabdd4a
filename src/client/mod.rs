//! Client-side orchestration for the news feed: a typed HTTP client plus
//! the in-memory presentation pipeline (filter, sort, paginate, reconcile)
//! a frontend drives against the API.

pub mod api;
pub mod feed;

pub use api::{ApiClient, ClientError, ClientResult};
pub use feed::{FeedEvent, FeedState, FeedView, SortOrder};
