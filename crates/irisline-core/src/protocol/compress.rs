//! zlib payload compression using `miniz_oxide`.
//!
//! The broker deflates every publish body in both directions.

use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;

use crate::error::{PushError, Result};

const COMPRESSION_LEVEL: u8 = 9;

/// Upper bound for an inflated publish body.
const MAX_INFLATED_BYTES: usize = 16 * 1024 * 1024;

pub fn deflate(input: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib(input, COMPRESSION_LEVEL)
}

pub fn inflate(input: &[u8]) -> Result<Vec<u8>> {
    decompress_to_vec_zlib_with_limit(input, MAX_INFLATED_BYTES)
        .map_err(|e| PushError::InvalidPayload(format!("inflate failed: {:?}", e.status)))
}
