use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use rustfst_lattice::{Codec, FractionalCounter, Lattice, Occupancy};

/// Count fractional N-Grams in a lattice in FST text format.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Lattice to count
    fsm: PathBuf,

    /// Maximum order of N-Grams
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    max_order: u32,

    /// Codec for the lattice and the output
    #[arg(short, long, default_value_t = Codec::Utf8)]
    codec: Codec,

    /// Output file ("-" for standard output)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let reader = args
        .codec
        .open(&args.fsm)
        .with_context(|| format!("reading {}", args.fsm.display()))?;
    let lattice = Lattice::read(reader)?;
    let occupancy = Occupancy::compute(&lattice)?;
    let mut counter = FractionalCounter::new(args.max_order as usize)?;
    counter.count_lattice(&lattice, &occupancy)?;
    info!(
        "{} N-Grams of order <= {} in {}",
        counter.counts().len(),
        args.max_order,
        args.fsm.display()
    );

    let mut out = Vec::new();
    counter.write_counts(&mut out)?;
    let bytes = args.codec.encode(std::str::from_utf8(&out)?)?;
    match &args.output {
        Some(path) if path.as_os_str() != "-" => File::create(path)
            .and_then(|mut fh| fh.write_all(&bytes))
            .with_context(|| format!("writing {}", path.display()))?,
        _ => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}
