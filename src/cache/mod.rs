//! In-memory response cache and miss coalescing.

mod entry;
pub mod flight;
mod store;

pub use entry::{CacheEntry, Headers, Metadata, NOT_FOUND_WEIGHT};
pub use flight::{Flight, Flights};
pub use store::CacheStore;
