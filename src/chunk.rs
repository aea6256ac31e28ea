// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Chunk source: slices an image into numbered 128-byte payloads

use crate::protocol::{PAD, PAYLOAD_LEN};

/// A numbered payload ready for framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub block: u8,
    pub payload: [u8; PAYLOAD_LEN],
}

/// Forward-only source of chunks over an in-memory image.
///
/// Data blocks are numbered from 1 and wrap modulo 256. Only the final
/// block may be shorter than 128 bytes; its tail is filled with 0xFF so
/// bootloaders that treat zero as valid data are not confused. For
/// YMODEM a single header chunk (block 0, filename then zero padding)
/// precedes the data.
pub struct ChunkSource {
    data: Vec<u8>,
    pos: usize,
    block: u8,
    header: Option<[u8; PAYLOAD_LEN]>,
}

impl ChunkSource {
    /// XMODEM source: data chunks only, numbered from 1.
    pub fn new(data: Vec<u8>) -> Self {
        ChunkSource {
            data,
            pos: 0,
            block: 1,
            header: None,
        }
    }

    /// YMODEM source: one header chunk carrying `filename`, then data.
    pub fn with_header(data: Vec<u8>, filename: &str) -> Self {
        let mut header = [0u8; PAYLOAD_LEN];
        for (dst, src) in header.iter_mut().zip(filename.bytes()) {
            *dst = src;
        }

        ChunkSource {
            data,
            pos: 0,
            block: 1,
            header: Some(header),
        }
    }

    /// Returns the next chunk, or `None` once the image is exhausted.
    /// Non-restartable: consumed chunks cannot be revisited.
    pub fn next_chunk(&mut self) -> Option<Chunk> {
        if let Some(payload) = self.header.take() {
            return Some(Chunk { block: 0, payload });
        }

        if self.pos >= self.data.len() {
            return None;
        }

        let take = (self.data.len() - self.pos).min(PAYLOAD_LEN);
        let mut payload = [PAD; PAYLOAD_LEN];
        payload[..take].copy_from_slice(&self.data[self.pos..self.pos + take]);
        self.pos += take;

        let block = self.block;
        self.block = self.block.wrapping_add(1);

        Some(Chunk { block, payload })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_short_chunk_padded() {
        let mut source = ChunkSource::new(vec![0x42]);

        let chunk = source.next_chunk().unwrap();
        assert_eq!(chunk.block, 1);
        assert_eq!(chunk.payload[0], 0x42);
        assert!(chunk.payload[1..].iter().all(|&b| b == PAD));

        assert!(source.next_chunk().is_none());
    }

    #[test]
    fn test_full_chunks_are_verbatim() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = ChunkSource::new(data.clone());

        let first = source.next_chunk().unwrap();
        assert_eq!(first.block, 1);
        assert_eq!(&first.payload[..], &data[..128]);

        let second = source.next_chunk().unwrap();
        assert_eq!(second.block, 2);
        assert_eq!(&second.payload[..], &data[128..]);

        assert!(source.next_chunk().is_none());
    }

    #[test]
    fn test_final_partial_chunk() {
        let data = vec![0x11u8; 300];
        let mut source = ChunkSource::new(data);

        source.next_chunk().unwrap();
        source.next_chunk().unwrap();

        let last = source.next_chunk().unwrap();
        assert_eq!(last.block, 3);
        assert!(last.payload[..44].iter().all(|&b| b == 0x11));
        assert!(last.payload[44..].iter().all(|&b| b == PAD));

        assert!(source.next_chunk().is_none());
    }

    #[test]
    fn test_empty_image() {
        let mut source = ChunkSource::new(Vec::new());
        assert!(source.next_chunk().is_none());
    }

    #[test]
    fn test_header_chunk() {
        let mut source = ChunkSource::with_header(vec![0xAA; 130], "fw.bin");

        let header = source.next_chunk().unwrap();
        assert_eq!(header.block, 0);
        assert_eq!(&header.payload[..6], b"fw.bin");
        assert!(header.payload[6..].iter().all(|&b| b == 0));

        let first = source.next_chunk().unwrap();
        assert_eq!(first.block, 1);
        assert!(first.payload.iter().all(|&b| b == 0xAA));

        let second = source.next_chunk().unwrap();
        assert_eq!(second.block, 2);
        assert_eq!(&second.payload[..2], &[0xAA, 0xAA]);
        assert!(second.payload[2..].iter().all(|&b| b == PAD));
    }

    #[test]
    fn test_header_with_empty_image() {
        let mut source = ChunkSource::with_header(Vec::new(), "fw.bin");
        assert_eq!(source.next_chunk().unwrap().block, 0);
        assert!(source.next_chunk().is_none());
    }

    #[test]
    fn test_long_filename_truncated() {
        let name = "x".repeat(200);
        let mut source = ChunkSource::with_header(Vec::new(), &name);
        let header = source.next_chunk().unwrap();
        assert!(header.payload.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn test_block_number_wraps() {
        // 257 full blocks: numbers run 1..=255, 0, 1
        let data = vec![0u8; 128 * 257];
        let mut source = ChunkSource::new(data);

        for expected in 1..=255u8 {
            assert_eq!(source.next_chunk().unwrap().block, expected);
        }
        assert_eq!(source.next_chunk().unwrap().block, 0);
        assert_eq!(source.next_chunk().unwrap().block, 1);
        assert!(source.next_chunk().is_none());
    }
}
