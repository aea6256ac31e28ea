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

//! CRC-16/XMODEM, computed bit-serially

const CRC_POLY: u16 = 0x1021;

/// One shift step of the polynomial division. `bit` is the next input bit.
fn crc_update(crc: u16, bit: bool) -> u16 {
    let carry = crc >> 15;
    let mut out = crc << 1;

    if bit {
        out |= 1;
    }

    if carry != 0 {
        out ^= CRC_POLY;
    }

    out
}

/// Computes the CRC-16/XMODEM checksum of `data` (poly 0x1021, init 0,
/// MSB first). The 16 trailing zero-bit steps flush the implicitly
/// appended check bytes through the register.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;

    for byte in data {
        for shift in (0..8).rev() {
            crc = crc_update(crc, byte & (1 << shift) != 0);
        }
    }

    for _ in 0..16 {
        crc = crc_update(crc, false);
    }

    crc
}

// ============================================================================
// Tests
// ============================================================================
