//! vblock CLI Client
//!
//! Command-line interface for interacting with a vblock server.

use std::io::Write;

use clap::{Parser, Subcommand};
use vblock::network::Client;
use vblock::{Result, VBlockError};

/// vblock CLI
#[derive(Parser, Debug)]
#[command(name = "vblock-cli")]
#[command(about = "CLI for the vblock virtual block device")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7410")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a frame: `key:offset:data` or `offset:data`
    Write {
        /// The frame, e.g. 111:0:HELLO
        frame: String,
    },

    /// Read bytes from an offset
    Read {
        offset: u32,
        size: u32,
    },

    /// Lock a region (0-7)
    Lock {
        #[arg(allow_negative_numbers = true)]
        region: i32,
    },

    /// Unlock a region (0-7)
    Unlock {
        #[arg(allow_negative_numbers = true)]
        region: i32,
    },

    /// Read a full region
    ReadRegion {
        #[arg(allow_negative_numbers = true)]
        region: i32,
    },

    /// Read a full mirror region
    ReadMirror {
        #[arg(allow_negative_numbers = true)]
        region: i32,
    },

    /// Erase (zero) a region
    Erase {
        #[arg(allow_negative_numbers = true)]
        region: i32,
    },

    /// Show device geometry and lock bitmap
    Info,

    /// Back the device up to a file on the server host
    Backup {
        /// Destination path, e.g. /tmp/vblock.bin
        path: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        match e {
            VBlockError::PermissionDenied(_) => {
                eprintln!("ERROR: Permission denied (region is locked, key missing or invalid)")
            }
            other => eprintln!("ERROR: {}", other),
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match &args.command {
        Commands::Write { frame } => {
            let written = client.write(frame.as_bytes())?;
            println!("Write OK ({} bytes)", written);
        }
        Commands::Read { offset, size } => {
            let data = client.read(*offset, *size)?;
            println!("Read Data: {}", String::from_utf8_lossy(&data));
        }
        Commands::Lock { region } => {
            client.lock_region(*region)?;
            println!("Region {} locked.", region);
        }
        Commands::Unlock { region } => {
            client.unlock_region(*region)?;
            println!("Region {} unlocked.", region);
        }
        Commands::ReadRegion { region } => {
            let region = client.read_region(*region)?;
            println!("Region {} data:", region.region);
            print_raw(&region.data)?;
        }
        Commands::ReadMirror { region } => {
            let region = client.read_mirror(*region)?;
            println!("--- MIRROR DATA (Region {}) ---", region.region);
            print_raw(&region.data)?;
        }
        Commands::Erase { region } => {
            client.erase_region(*region)?;
            println!("Region {} erased.", region);
        }
        Commands::Info => {
            let info = client.info()?;
            println!("=== DEVICE INFO ===");
            println!("Size          : {}", info.size);
            println!("Region size   : {}", info.region_size);
            println!("Num regions   : {}", info.num_regions);
            println!("Lock bitmap   : 0x{:02x}", info.lock_bitmap);
        }
        Commands::Backup { path } => {
            let report = client.backup(path)?;
            println!(
                "Backup saved to {} ({} bytes, crc32 {:08x})",
                report.path.display(),
                report.bytes_written,
                report.checksum
            );
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}

/// Dump region bytes as-is, followed by a newline
fn print_raw(data: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(data)?;
    writeln!(stdout)?;
    Ok(())
}
