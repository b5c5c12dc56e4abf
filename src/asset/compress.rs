//! Gzip encoding for compressible responses.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Gzip-encode `data` at the default compression level.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
