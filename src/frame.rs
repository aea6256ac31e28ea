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

//! Frame codec: 133-byte on-wire XMODEM/YMODEM frames

use crate::crc::crc16;
use crate::protocol::{FRAME_LEN, PAYLOAD_LEN, SOH};

/// One protocol frame before serialization. A header frame is just a
/// frame with `block == 0`; the start marker does not distinguish them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub block: u8,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    pub fn new(block: u8, payload: [u8; PAYLOAD_LEN]) -> Self {
        Frame { block, payload }
    }

    /// Serializes the frame field by field:
    /// `[SOH, block, 0xFF - block, payload, crc_hi, crc_lo]`.
    /// The CRC covers exactly the 128 payload bytes, high byte first.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut wire = [0u8; FRAME_LEN];
        wire[0] = SOH;
        wire[1] = self.block;
        wire[2] = 0xFF - self.block;
        wire[3..3 + PAYLOAD_LEN].copy_from_slice(&self.payload);

        let crc = crc16(&self.payload);
        wire[FRAME_LEN - 2] = (crc >> 8) as u8;
        wire[FRAME_LEN - 1] = (crc & 0xFF) as u8;

        wire
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = 0xDE;
        payload[127] = 0xAD;

        let wire = Frame::new(7, payload).encode();

        assert_eq!(wire.len(), 133);
        assert_eq!(wire[0], SOH);
        assert_eq!(wire[1], 7);
        assert_eq!(wire[2], 0xF8);
        assert_eq!(&wire[3..131], &payload[..]);

        let crc = crc16(&payload);
        assert_eq!(wire[131], (crc >> 8) as u8);
        assert_eq!(wire[132], (crc & 0xFF) as u8);
    }

    #[test]
    fn test_block_complement_all_values() {
        let payload = [0u8; PAYLOAD_LEN];
        for block in 0..=255u8 {
            let wire = Frame::new(block, payload).encode();
            assert_eq!(wire[2], 0xFF - block);
            assert_eq!(wire[1].wrapping_add(wire[2]), 0xFF);
        }
    }

    #[test]
    fn test_header_frame_uses_same_marker() {
        let wire = Frame::new(0, [0u8; PAYLOAD_LEN]).encode();
        assert_eq!(wire[0], SOH);
        assert_eq!(wire[1], 0);
        assert_eq!(wire[2], 0xFF);
    }

    #[test]
    fn test_encode_is_pure() {
        let frame = Frame::new(42, [0x5Au8; PAYLOAD_LEN]);
        assert_eq!(frame.encode(), frame.encode());
    }
}
