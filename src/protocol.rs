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

//! XMODEM/YMODEM protocol constants

/// Start of header - begins every 133-byte frame, header and data alike
pub const SOH: u8 = 0x01;

/// End of transmission - no more data frames follow (sent twice for YMODEM)
pub const EOT: u8 = 0x04;

/// Acknowledge - receiver accepted the frame
pub const ACK: u8 = 0x06;

/// Negative acknowledge - receiver rejected the frame, retransmit it
pub const NAK: u8 = 0x15;

/// Receiver reports the image exceeds the board's flash capacity
pub const SIZE_OVER: u8 = 0x0F;

/// Handshake character - three in a row means the receiver wants CRC-16 mode
pub const SYNC: u8 = b'C';

/// Fill byte for the tail of a short final data block
pub const PAD: u8 = 0xFF;

/// Payload bytes per frame
pub const PAYLOAD_LEN: usize = 128;

/// Total on-wire frame length: marker, block, complement, payload, CRC
pub const FRAME_LEN: usize = PAYLOAD_LEN + 5;

/// Protocol variant. YMODEM prefixes the data with a filename-bearing
/// header frame (block 0) and doubles the trailing EOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Xmodem,
    Ymodem,
}
