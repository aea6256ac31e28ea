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

use std::io::Write;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use crate::chunk::ChunkSource;
use crate::frame::Frame;
use crate::protocol::*;
use crate::serial::SerialPort;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum SenderError {
    Io(std::io::Error),
    /// Receiver signalled the image is larger than the board can hold
    SizeExceeded,
    /// Unrecognized response byte, or no response at all
    Unresponsive,
    /// NAK retry ceiling reached on a single block
    RetriesExhausted,
    /// The receiver never offered the CRC-mode handshake
    HandshakeTimeout,
    TransferComplete,
}

impl std::fmt::Display for SenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenderError::Io(e) => write!(f, "I/O error: {}", e),
            SenderError::SizeExceeded => {
                write!(f, "image exceeds the board's flash capacity, please reduce the program size and try again")
            }
            SenderError::Unresponsive => {
                write!(f, "device appears unresponsive, please reset the board and try again")
            }
            SenderError::RetriesExhausted => write!(f, "block rejected too many times, giving up"),
            SenderError::HandshakeTimeout => {
                write!(f, "timed out waiting for the bootloader handshake")
            }
            SenderError::TransferComplete => write!(f, "Transfer complete"),
        }
    }
}

impl std::error::Error for SenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SenderError {
    fn from(err: std::io::Error) -> Self {
        SenderError::Io(err)
    }
}

// ============================================================================
// States
// ============================================================================

pub struct AwaitHandshake;
pub struct SendBlock;
pub struct SendEot;
pub struct StartTarget;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct SenderFsm<State> {
    state: PhantomData<State>,
    serial: Box<dyn SerialPort>,
    protocol: Protocol,
    source: ChunkSource,
    wire: [u8; FRAME_LEN],
    retries_left: u32,
    max_retries: u32,
    handshake_deadline: Instant,
    sync_run: u8,
    debug: bool,
}

// ============================================================================
// Trait
// ============================================================================

pub trait SenderState: Send {
    fn step(self: Box<Self>) -> Result<Box<dyn SenderState>, SenderError>;
}

// ============================================================================
// Helpers
// ============================================================================

impl<S> SenderFsm<S> {
    fn transition<T>(self) -> Box<SenderFsm<T>> {
        Box::new(SenderFsm {
            state: PhantomData,
            serial: self.serial,
            protocol: self.protocol,
            source: self.source,
            wire: self.wire,
            retries_left: self.retries_left,
            max_retries: self.max_retries,
            handshake_deadline: self.handshake_deadline,
            sync_run: self.sync_run,
            debug: self.debug,
        })
    }

    fn io_error(&self, e: std::io::Error) -> SenderError {
        let type_name = std::any::type_name::<S>();
        let state_name = type_name.split("::").last().unwrap_or(type_name);
        SenderError::Io(std::io::Error::new(
            e.kind(),
            format!("{} (in state: {})", e, state_name)
        ))
    }

    /// Encodes the next chunk into the send buffer. False means the
    /// source is exhausted.
    fn load_next_chunk(&mut self) -> bool {
        match self.source.next_chunk() {
            Some(chunk) => {
                if self.debug { println!("Prepared block {}", chunk.block); }
                self.wire = Frame::new(chunk.block, chunk.payload).encode();
                true
            }
            None => false,
        }
    }

    fn glyph(&self, status: char) {
        print!("{}", status);
        std::io::stdout().flush().ok();
    }
}

// ============================================================================
// State Implementations
// ============================================================================

impl SenderState for SenderFsm<AwaitHandshake> {
    fn step(self: Box<Self>) -> Result<Box<dyn SenderState>, SenderError> {
        let mut fsm = *self;

        match fsm.serial.read_byte() {
            Ok(SYNC) => {
                fsm.sync_run += 1;
                if fsm.debug { println!("Received: 'C' ({} of 3)", fsm.sync_run); }

                if fsm.sync_run < 3 {
                    return Ok(Box::new(fsm) as Box<dyn SenderState>);
                }

                if fsm.load_next_chunk() {
                    let next = fsm.transition::<SendBlock>();
                    Ok(next as Box<dyn SenderState>)
                } else {
                    // Nothing to send, straight to end of transmission
                    let next = fsm.transition::<SendEot>();
                    Ok(next as Box<dyn SenderState>)
                }
            }
            Ok(other) => {
                if fsm.debug { println!("Ignoring 0x{:02X} while waiting for 'C'", other); }
                fsm.sync_run = 0;
                if Instant::now() >= fsm.handshake_deadline {
                    return Err(SenderError::HandshakeTimeout);
                }
                Ok(Box::new(fsm) as Box<dyn SenderState>)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                if Instant::now() >= fsm.handshake_deadline {
                    return Err(SenderError::HandshakeTimeout);
                }
                Ok(Box::new(fsm) as Box<dyn SenderState>)
            }
            Err(e) => Err(fsm.io_error(e)),
        }
    }
}

impl SenderState for SenderFsm<SendBlock> {
    fn step(self: Box<Self>) -> Result<Box<dyn SenderState>, SenderError> {
        let mut fsm = *self;

        // The buffered encoding is resent verbatim on NAK, so a retried
        // block goes out byte-identical to the original attempt.
        fsm.serial.write_all(&fsm.wire)?;
        if fsm.debug { println!("Sent: block {} ({} bytes)", fsm.wire[1], fsm.wire.len()); }

        match fsm.serial.read_byte() {
            Ok(ACK) => {
                fsm.glyph('.');
                fsm.retries_left = fsm.max_retries;

                if fsm.load_next_chunk() {
                    Ok(Box::new(fsm) as Box<dyn SenderState>)
                } else {
                    let next = fsm.transition::<SendEot>();
                    Ok(next as Box<dyn SenderState>)
                }
            }
            Ok(NAK) => {
                fsm.glyph('N');
                if fsm.retries_left == 0 {
                    return Err(SenderError::RetriesExhausted);
                }
                fsm.retries_left -= 1;
                if fsm.debug { println!("NAK, {} retries left", fsm.retries_left); }
                Ok(Box::new(fsm) as Box<dyn SenderState>)
            }
            Ok(SIZE_OVER) => Err(SenderError::SizeExceeded),
            Ok(other) => {
                if fsm.debug { println!("Unexpected response: 0x{:02X}", other); }
                Err(SenderError::Unresponsive)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(SenderError::Unresponsive),
            Err(e) => Err(fsm.io_error(e)),
        }
    }
}

impl SenderState for SenderFsm<SendEot> {
    fn step(self: Box<Self>) -> Result<Box<dyn SenderState>, SenderError> {
        let mut fsm = *self;

        fsm.serial.write_all(&[EOT])?;
        if fsm.protocol == Protocol::Ymodem {
            // YMODEM convention: EOT goes out twice
            fsm.serial.write_all(&[EOT])?;
        }
        if fsm.debug { println!("Sent: EOT"); }

        let next = fsm.transition::<StartTarget>();
        Ok(next as Box<dyn SenderState>)
    }
}

impl SenderState for SenderFsm<StartTarget> {
    fn step(self: Box<Self>) -> Result<Box<dyn SenderState>, SenderError> {
        let mut fsm = *self;

        // A bare newline makes the bootloader jump into the uploaded image
        fsm.serial.write_all(b"\n")?;
        if fsm.debug { println!("Sent: start marker"); }

        Err(SenderError::TransferComplete)
    }
}

// ============================================================================
// Constructor
// ============================================================================

impl SenderFsm<AwaitHandshake> {
    pub fn new(
        serial: Box<dyn SerialPort>,
        protocol: Protocol,
        source: ChunkSource,
        max_retries: u32,
        handshake_timeout: Duration,
        debug: bool,
    ) -> Box<dyn SenderState> {
        Box::new(SenderFsm {
            state: PhantomData::<AwaitHandshake>,
            serial,
            protocol,
            source,
            wire: [0; FRAME_LEN],
            retries_left: max_retries,
            max_retries,
            handshake_deadline: Instant::now() + handshake_timeout,
            sync_run: 0,
            debug,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
