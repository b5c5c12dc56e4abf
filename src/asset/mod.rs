//! Transform helpers: minification, compression, hashing.

pub mod compress;
pub mod etag;
mod literals;
pub mod minify;
