use anyhow::{anyhow, Result};
use rustfst::prelude::*;
use std::io::prelude::*;

use crate::StdVectorFst;

/// Write an FST in the AT&T text format used by `fstcompile`, with
/// symbols instead of labels.
///
/// States are written in order so that the arcs of the start state
/// (which must be state 0) come first.  Final states follow the arcs,
/// one per line, with the weight only if it is not one.
pub fn write_fst_text<W: Write>(fst: &StdVectorFst, out: &mut W) -> Result<()> {
    let isyms = fst
        .input_symbols()
        .ok_or_else(|| anyhow!("FST has no input symbols"))?;
    let osyms = fst
        .output_symbols()
        .ok_or_else(|| anyhow!("FST has no output symbols"))?;
    for state in fst.states_iter() {
        let trs = fst.get_trs(state)?;
        for tr in trs.trs() {
            writeln!(
                out,
                "{} {} {} {} {}",
                state,
                tr.nextstate,
                symbol(isyms, tr.ilabel)?,
                symbol(osyms, tr.olabel)?,
                tr.weight.value()
            )?;
        }
    }
    for state in fst.states_iter() {
        match fst.final_weight(state)? {
            Some(weight) if weight == TropicalWeight::one() => writeln!(out, "{}", state)?,
            Some(weight) => writeln!(out, "{} {}", state, weight.value())?,
            None => (),
        }
    }
    Ok(())
}

fn symbol(syms: &SymbolTable, label: Label) -> Result<&str> {
    syms.get_symbol(label)
        .ok_or_else(|| anyhow!("label {} not in symbol table", label))
}

/// Write a symbol table as `symbol id` lines, in ID order.
pub fn write_symbols<W: Write>(syms: &SymbolTable, out: &mut W) -> Result<()> {
    for label in 0..syms.len() {
        let label = label as Label;
        if let Some(symbol) = syms.get_symbol(label) {
            writeln!(out, "{} {}", symbol, label)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make::{MakerConfig, NGramFstMaker};
    use std::fs::File;
    use std::io::BufReader;

    fn make_text(path: &str) -> String {
        let fh = File::open(path).unwrap();
        let fst = NGramFstMaker::new(MakerConfig::default())
            .unwrap()
            .make_from_arpa(BufReader::new(fh))
            .unwrap();
        let mut out = Vec::new();
        write_fst_text(&fst, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn it_writes_unigram_fsts() {
        let text = make_text("testdata/unigram.arpa");
        assert_eq!(
            text,
            "0 1 <s> <s> 1000000\n\
             0 3 <s> <s> 0.5\n\
             3 3 word word 0.25\n\
             3 2 </s> </s> 0.125\n\
             2\n"
        );
    }

    #[test]
    fn it_writes_zero_costs() {
        let fst = NGramFstMaker::new(MakerConfig::default())
            .unwrap()
            .make_from_arpa("\\1-grams:\n0 </s>\n".as_bytes())
            .unwrap();
        let mut out = Vec::new();
        write_fst_text(&fst, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("3 2 </s> </s> 0\n"));
        assert!(!text.contains("-0"));
    }

    #[test]
    fn it_writes_trigram_fsts() {
        let text = make_text("testdata/trigram.arpa");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0 1 <s> <s> 1000000");
        assert_eq!(lines[1], "0 1 <s> <s> 99");
        assert!(lines.contains(&"7 4 <eps> <eps> 0.15"));
        assert!(lines.contains(&"7 8 cat cat 0.05"));
        assert_eq!(lines.last(), Some(&"2"));
    }

    #[test]
    fn it_writes_symbols() {
        let mut syms = SymbolTable::new();
        syms.add_symbol("<s>");
        syms.add_symbol("a");
        let mut out = Vec::new();
        write_symbols(&syms, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<eps> 0\n<s> 1\na 2\n");
    }
}
