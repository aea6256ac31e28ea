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

// XMODEM/YMODEM firmware uploader
mod protocol;
mod crc;
mod frame;
mod chunk;
mod sender;
mod serial;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use chunk::ChunkSource;
use protocol::Protocol;
use sender::{SenderError, SenderFsm, SenderState};
use serial::RealSerialPort;

#[derive(Parser)]
#[command(name = "xyload")]
#[command(about = "Uploads a firmware image to a microcontroller over XMODEM/YMODEM", long_about = None)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Protocol variant (xmodem or ymodem)
    #[arg(long, default_value = "xmodem")]
    protocol: String,

    /// Maximum resends of a single block before giving up
    #[arg(long, default_value = "10", value_name = "N")]
    max_retries: u32,

    /// Seconds to wait for the bootloader's 'CCC' handshake
    #[arg(long, default_value = "60", value_name = "SECS")]
    handshake_timeout: u64,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Firmware image to upload
    image: PathBuf,
}

fn parse_protocol(protocol: &str) -> Result<Protocol, String> {
    match protocol.to_lowercase().as_str() {
        "xmodem" => Ok(Protocol::Xmodem),
        "ymodem" => Ok(Protocol::Ymodem),
        _ => Err(format!("Invalid protocol: {}. Must be 'xmodem' or 'ymodem'", protocol)),
    }
}

fn main() {
    let cli = Cli::parse();

    let protocol = match parse_protocol(&cli.protocol) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let image = match std::fs::read(&cli.image) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.image.display(), e);
            std::process::exit(e.raw_os_error().unwrap_or(1));
        }
    };

    println!("Opening serial port: {}", cli.port);
    println!("Settings: {} baud, 8N1, no flow control", cli.baud);

    let serial_port = match RealSerialPort::open(&cli.port, cli.baud) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Failed to open serial port: {}", e);
            std::process::exit(1);
        }
    };

    let source = match protocol {
        Protocol::Xmodem => ChunkSource::new(image),
        Protocol::Ymodem => ChunkSource::with_header(image, &image_name(&cli.image)),
    };

    println!("\nUploading {} ", cli.image.display());

    match send_image(serial_port, protocol, source, &cli) {
        Ok(()) => {
            println!("\ndone.");
        }
        Err(SenderError::Io(e)) => {
            eprintln!("\nUpload failed: {}", e);
            std::process::exit(e.raw_os_error().unwrap_or(1));
        }
        Err(e @ SenderError::SizeExceeded) | Err(e @ SenderError::Unresponsive) => {
            // Historical tool behavior: protocol-fatal conditions print a
            // diagnostic and exit 0
            println!("\n!!! ERROR: {}", e);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("\nUpload failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn send_image(
    serial_port: RealSerialPort,
    protocol: Protocol,
    source: ChunkSource,
    cli: &Cli,
) -> Result<(), SenderError> {
    let mut state: Box<dyn SenderState> = SenderFsm::new(
        Box::new(serial_port),
        protocol,
        source,
        cli.max_retries,
        Duration::from_secs(cli.handshake_timeout),
        cli.debug,
    );

    loop {
        match state.step() {
            Ok(next_state) => {
                state = next_state;
            }
            Err(SenderError::TransferComplete) => {
                return Ok(());
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
}

/// Final path component, as reported to the receiver in the YMODEM header
fn image_name(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
