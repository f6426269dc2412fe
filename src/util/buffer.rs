//! Synthetic upload data
//!
//! Upload workers never read real data. Each one streams a [`SyntheticReader`]:
//! a fixed-length byte stream served from one small buffer that is filled
//! once and then replayed from its start on every read.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};

/// Fill pattern for the synthetic buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPattern {
    /// All zeros
    Zeros,
    /// One batch of OS-random bytes, generated once per reader and reused
    Random,
}

impl Default for FillPattern {
    fn default() -> Self {
        Self::Zeros
    }
}

impl fmt::Display for FillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPattern::Zeros => write!(f, "zeros"),
            FillPattern::Random => write!(f, "random"),
        }
    }
}

/// Bounded byte stream backed by a single reusable buffer
///
/// A read copies `min(dst.len(), buffer.len(), remaining)` bytes from the
/// start of the internal buffer. A request larger than the internal buffer
/// is only partially served, so draining a large destination takes several
/// calls. Once `total` bytes have been emitted every read returns `Ok(0)`.
///
/// Not shareable between workers: each upload owns one reader.
pub struct SyntheticReader {
    buf: Vec<u8>,
    remaining: u64,
}

impl SyntheticReader {
    /// Create a reader that emits `total` bytes from a `buf_size` byte buffer
    pub fn new(total: u64, buf_size: usize, pattern: FillPattern) -> Self {
        let mut buf = vec![0u8; buf_size];
        if pattern == FillPattern::Random {
            OsRng.fill_bytes(&mut buf);
        }
        Self {
            buf,
            remaining: total,
        }
    }

    /// Bytes left to emit
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The buffer every read copies from
    pub fn pattern_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl Read for SyntheticReader {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        let n = dst.len().min(self.buf.len()).min(remaining);
        dst[..n].copy_from_slice(&self.buf[..n]);
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl fmt::Debug for SyntheticReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticReader")
            .field("buf_size", &self.buf.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    fn drain(reader: &mut SyntheticReader, chunk: usize) -> u64 {
        let mut buf = vec![0xAAu8; chunk];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            total += n as u64;
        }
        total
    }

    #[test]
    fn test_equal_buffers() {
        let mut r = SyntheticReader::new(100 * MB as u64, MB, FillPattern::Zeros);
        assert_eq!(drain(&mut r, MB), 100 * MB as u64);
    }

    #[test]
    fn test_caller_buffer_larger_than_internal() {
        let mut r = SyntheticReader::new(100 * MB as u64, MB, FillPattern::Random);
        let mut buf = vec![0u8; 5 * MB];
        assert_eq!(r.read(&mut buf).unwrap(), MB);
        assert_eq!(drain(&mut r, 5 * MB), 99 * MB as u64);
    }

    #[test]
    fn test_caller_buffer_smaller_than_internal() {
        let mut r = SyntheticReader::new(100 * MB as u64, 5 * MB, FillPattern::Zeros);
        assert_eq!(drain(&mut r, MB), 100 * MB as u64);
    }

    #[test]
    fn test_total_not_multiple_of_buffer() {
        let mut r = SyntheticReader::new(10_000, 4096, FillPattern::Random);
        let mut buf = vec![0u8; 4096];
        assert_eq!(r.read(&mut buf).unwrap(), 4096);
        assert_eq!(r.read(&mut buf).unwrap(), 4096);
        assert_eq!(r.read(&mut buf).unwrap(), 10_000 - 8192);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_zero_total() {
        let mut r = SyntheticReader::new(0, 4096, FillPattern::Zeros);
        let mut buf = vec![0u8; 16];
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_zero_fill_content() {
        let mut r = SyntheticReader::new(3 * 4096, 4096, FillPattern::Zeros);
        let mut buf = vec![0xFFu8; 4096];
        while r.read(&mut buf).unwrap() > 0 {
            assert!(buf.iter().all(|&b| b == 0));
            buf.fill(0xFF);
        }
    }

    #[test]
    fn test_random_fill_repeats_across_reads() {
        let mut r = SyntheticReader::new(64 * 1024, 1024, FillPattern::Random);
        let pattern = r.pattern_bytes().to_vec();
        assert!(pattern.iter().any(|&b| b != 0));

        let mut first = vec![0u8; 1024];
        let mut second = vec![0u8; 1024];
        r.read(&mut first).unwrap();
        r.read(&mut second).unwrap();
        assert_eq!(first, pattern);
        assert_eq!(second, pattern);

        // a short read still comes from the start of the buffer
        let mut short = vec![0u8; 100];
        assert_eq!(r.read(&mut short).unwrap(), 100);
        assert_eq!(short[..], pattern[..100]);
    }

    #[test]
    fn test_fill_pattern_serde_names() {
        assert_eq!(serde_json::to_string(&FillPattern::Random).unwrap(), "\"random\"");
        assert_eq!(FillPattern::default(), FillPattern::Zeros);
        assert_eq!(FillPattern::Zeros.to_string(), "zeros");
    }
}
