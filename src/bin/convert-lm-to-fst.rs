use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rustfst::prelude::*;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use rustfst_lattice::text::{write_fst_text, write_symbols};
use rustfst_lattice::{BackoffPolicy, Codec, MakerConfig, NGramFstMaker};

/// Convert an ARPA format language model (up to trigrams) to the text
/// representation of an FST, which can be compiled with `fstcompile`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// ARPA format language model
    lm: PathBuf,

    /// Symbol for the start of a sentence
    #[arg(short, long, default_value = "<s>")]
    start_symbol: String,

    /// Symbol for the end of a sentence
    #[arg(short, long, default_value = "</s>")]
    end_symbol: String,

    /// "once" also lets bigram states back off straight to the null
    /// state; "twice" only backs off to the unigram state
    #[arg(short, long, default_value_t = BackoffPolicy::Once)]
    backoff: BackoffPolicy,

    /// Codec for the language model and the output
    #[arg(short, long, default_value_t = Codec::Utf8)]
    codec: Codec,

    /// Output file ("-" for standard output)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the symbol table to this file
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,
}

/// Write text to a file, or standard output
fn write_output(path: &Option<PathBuf>, codec: Codec, text: &str) -> Result<()> {
    let bytes = codec.encode(text)?;
    match path {
        Some(path) if path.as_os_str() != "-" => File::create(path)
            .and_then(|mut fh| fh.write_all(&bytes))
            .with_context(|| format!("writing {}", path.display())),
        _ => Ok(std::io::stdout().lock().write_all(&bytes)?),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = MakerConfig {
        start_symbol: args.start_symbol,
        end_symbol: args.end_symbol,
        backoff: args.backoff,
    };
    info!("converting {} with {:?}", args.lm.display(), config);
    let reader = args
        .codec
        .open(&args.lm)
        .with_context(|| format!("reading {}", args.lm.display()))?;
    let fst = NGramFstMaker::new(config)?.make_from_arpa(reader)?;

    let mut out = Vec::new();
    write_fst_text(&fst, &mut out)?;
    write_output(&args.output, args.codec, &String::from_utf8(out)?)?;
    if let Some(syms) = fst.input_symbols() {
        if args.symbols.is_some() {
            let mut out = Vec::new();
            write_symbols(syms, &mut out)?;
            write_output(&args.symbols, args.codec, &String::from_utf8(out)?)?;
        }
    }
    Ok(())
}
