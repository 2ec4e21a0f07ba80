//! Fixtures and a local mock search engine shared by the workspace tests.

mod error;
pub mod fixtures;
pub mod mock;

pub use error::{Error, Result};
pub use mock::{MockSearchEngine, RecordedRequest, unreachable_base_url};
