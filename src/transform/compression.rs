//! Zstd compression stage

use std::io::Read;

use crate::error::{Result, WireError};

/// Compress a whole frame
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::bulk::compress(data, level)
        .map_err(|e| WireError::Compression(format!("zstd compress failed: {}", e)))
}

/// Decompress a frame, refusing output larger than `limit` bytes
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::new(data)
        .map_err(|e| WireError::Compression(format!("create zstd decoder: {}", e)))?;

    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| WireError::Compression(format!("read zstd stream: {}", e)))?;
        if n == 0 {
            break;
        }
        if out.len() + n > limit {
            return Err(WireError::Compression(format!(
                "Decompressed frame exceeds {} bytes",
                limit
            )));
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}
