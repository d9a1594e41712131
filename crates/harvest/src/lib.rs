// ABOUTME: Library entry point for the Play Store review harvester.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, Review, AppInfo, ScrapeError, ErrorCode.

//! playreviews-harvest - collect user reviews and listing metadata for an app
//! from its public store page.
//!
//! Pages are fetched one at a time, review blocks are located with an ordered
//! chain of strategies, and every block is normalized into a [`Review`] with
//! field-level fallbacks. Extraction trouble yields fewer reviews, never an
//! error; only a blank identifier or a failed first fetch is reported.
//!
//! # Example
//!
//! ```no_run
//! use playreviews_harvest::{Client, ScrapeError};
//!
//! fn main() -> Result<(), ScrapeError> {
//!     let client = Client::builder().build()?;
//!     for review in client.collect_reviews("com.example.notes", 20)? {
//!         println!("{} ({}): {}", review.author, review.rating, review.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod date;
pub mod error;
pub mod extractors;
pub mod models;
pub mod options;
pub mod paginate;
pub mod resource;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::blocks::{BlockExtractor, RawBlock};
pub use crate::extractors::metadata::{extract_app_info, AppInfoExtractor};
pub use crate::extractors::review::{FieldDefaults, ReviewParser};
pub use crate::models::{AppInfo, Review};
pub use crate::options::{ClientBuilder, Options, DEFAULT_REVIEW_COUNT};
pub use crate::paginate::{Harvest, PageStep};
pub use crate::resource::PageSource;
