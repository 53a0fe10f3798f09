#![forbid(unsafe_code)]
use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use rsdelta::{Delta, Rsdiff, Rspatch, Signature, DEFAULT_BLOCK_LENGTH};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rdiff",
    version,
    about = "rsync-style signature, delta and patch tool",
    long_about = None,
)]
struct RdiffArgs {
    /// block size in bytes
    #[arg(
        short = 'b',
        long = "block-size",
        value_name = "BYTES",
        default_value_t = DEFAULT_BLOCK_LENGTH,
        global = true
    )]
    block_size: u32,

    /// read buffer size
    #[arg(long = "buffer-size", value_name = "BUFFER", global = true)]
    buffer_size: Option<usize>,

    /// more logging, repeat for more
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the signature of a basis file
    Signature {
        /// basis file
        #[arg(value_name = "BASIS")]
        basis_path: String,

        /// signature file
        #[arg(value_name = "SIGNATURE")]
        signature_path: String,
    },

    /// compute a delta from a signature and a new file
    Delta {
        /// signature file
        #[arg(value_name = "SIGNATURE")]
        signature_path: String,

        /// new file
        #[arg(value_name = "NEW")]
        new_path: String,

        /// delta file
        #[arg(value_name = "DELTA")]
        delta_path: String,
    },

    /// apply a delta to a basis file
    Patch {
        /// basis file, must be seekable
        #[arg(value_name = "BASIS")]
        basis_path: String,

        /// delta file
        #[arg(value_name = "DELTA")]
        delta_path: String,

        /// output file
        #[arg(value_name = "OUTPUT")]
        output_path: String,
    },
}

fn main() {
    let args = RdiffArgs::parse();
    init_logging(args.verbose);
    if let Err(e) = execute(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn execute(args: RdiffArgs) -> rsdelta::Result<()> {
    match args.command {
        Command::Signature {
            basis_path,
            signature_path,
        } => {
            let basis = open_input(&basis_path)?;
            let sig = Signature::new(basis, args.block_size)?;
            let n = sig.write(create_output(&signature_path)?)?;
            info!(blocks = sig.len(), bytes = n, "signature written");
        }
        Command::Delta {
            signature_path,
            new_path,
            delta_path,
        } => {
            if signature_path == "-" && new_path == "-" {
                return Err(invalid_input(
                    "signature and new file could not be stdin at the same time",
                ));
            }
            let sig = Signature::read(open_input(&signature_path)?)?;
            let mut rsdiff = Rsdiff::new(&sig);
            if let Some(bs) = args.buffer_size {
                rsdiff = rsdiff.buffer_size(bs);
            }
            let delta = rsdiff.compare(open_input(&new_path)?)?;
            let n = delta.write(create_output(&delta_path)?)?;
            info!(
                chunks = delta.len(),
                literal = delta.literal_len(),
                bytes = n,
                "delta written"
            );
        }
        Command::Patch {
            basis_path,
            delta_path,
            output_path,
        } => {
            if basis_path == "-" {
                return Err(invalid_input("basis file could not be stdin"));
            }
            let basis = fs::File::open(&basis_path)?;
            let delta = Delta::read(open_input(&delta_path)?)?;
            let mut rspatch = Rspatch::new(&delta);
            if let Some(bs) = args.buffer_size {
                rspatch = rspatch.buffer_size(bs);
            }
            let n = rspatch.apply(basis, create_output(&output_path)?)?;
            info!(bytes = n, "output written");
        }
    }
    Ok(())
}

fn open_input(path: &str) -> io::Result<Box<dyn Read>> {
    if path == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(fs::File::open(path)?))
    }
}

fn create_output(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(io::BufWriter::new(io::stdout())))
    } else {
        Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
    }
}

fn invalid_input(msg: &str) -> rsdelta::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg).into()
}
