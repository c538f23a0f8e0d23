use anyhow::{anyhow, Result};
use log::info;
use rustfst::StateId;
use std::collections::BTreeMap;
use std::io::prelude::*;

use crate::lattice::Lattice;
use crate::occupancy::Occupancy;

/// Count fractional N-Grams in a lattice.
///
/// Every path of up to `order` arcs starting at any state contributes
/// the occupancy of that state, divided by the out-degree of each state
/// it passes through, to the N-Gram made of its labels (and to each of
/// its prefixes).
#[derive(Debug)]
pub struct FractionalCounter {
    /// Maximum order of N-Grams to count
    pub order: usize,
    /// Expected counts, keyed by space-separated N-Gram
    counts: BTreeMap<String, f64>,
}

impl FractionalCounter {
    pub fn new(order: usize) -> Result<Self> {
        if order == 0 {
            return Err(anyhow!("N-Gram order must be at least 1"));
        }
        Ok(Self {
            order,
            counts: BTreeMap::new(),
        })
    }

    fn add_count(&mut self, ngram: &[&str], count: f64) {
        *self.counts.entry(ngram.join(" ")).or_insert(0.0) += count;
    }

    /// Count N-Grams starting at one state.
    fn count_from_state(&mut self, lattice: &Lattice, start: StateId, occupancy: f64) -> Result<()> {
        // (state, history, probability mass)
        let mut stack: Vec<(StateId, Vec<&str>, f64)> = vec![(start, Vec::new(), occupancy)];
        while let Some((state, history, mass)) = stack.pop() {
            if !history.is_empty() {
                self.add_count(&history, mass);
            }
            if history.len() >= self.order {
                continue;
            }
            let node = lattice
                .node(state)
                .ok_or_else(|| anyhow!("no state {} in lattice", state))?;
            let mass = mass / node.out_degree() as f64;
            for tr in node.children.iter() {
                let mut history = history.clone();
                history.push(&tr.label);
                stack.push((tr.state, history, mass));
            }
        }
        Ok(())
    }

    /// Count N-Grams from every state of a lattice.
    pub fn count_lattice(&mut self, lattice: &Lattice, occupancy: &Occupancy) -> Result<()> {
        for (state, _) in lattice.nodes() {
            self.count_from_state(lattice, state, occupancy.get(state))?;
        }
        info!("counted {} distinct N-Grams", self.counts.len());
        Ok(())
    }

    /// Read a lattice, compute occupancy and count it.
    pub fn count_from_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let lattice = Lattice::read(reader)?;
        let occupancy = Occupancy::compute(&lattice)?;
        self.count_lattice(&lattice, &occupancy)
    }

    pub fn get(&self, ngram: &str) -> Option<f64> {
        self.counts.get(ngram).copied()
    }

    /// All counts, sorted by N-Gram.
    pub fn counts(&self) -> &BTreeMap<String, f64> {
        &self.counts
    }

    /// Write `count ngram` lines, sorted by N-Gram.
    pub fn write_counts<W: Write>(&self, out: &mut W) -> Result<()> {
        for (ngram, count) in self.counts.iter() {
            writeln!(out, "{:?} {}", count, ngram)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufReader;

    fn count_file(path: &str, order: usize) -> FractionalCounter {
        let mut counter = FractionalCounter::new(order).unwrap();
        counter
            .count_from_reader(BufReader::new(File::open(path).unwrap()))
            .unwrap();
        counter
    }

    fn written(counter: &FractionalCounter) -> String {
        let mut out = Vec::new();
        counter.write_counts(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn it_counts_branches() {
        let counter = count_file("testdata/branch.fst.txt", 1);
        assert_eq!(counter.counts().len(), 2);
        assert_eq!(counter.get("A"), Some(0.5));
        assert_eq!(counter.get("B"), Some(0.5));
        assert_eq!(written(&counter), "0.5 A\n0.5 B\n");
    }

    #[test]
    fn it_counts_chains() {
        let counter = count_file("testdata/chain.fst.txt", 2);
        assert_eq!(counter.get("X"), Some(1.0));
        assert_eq!(counter.get("Y"), Some(1.0));
        assert_eq!(counter.get("X Y"), Some(1.0));
        assert_eq!(written(&counter), "1.0 X\n1.0 X Y\n1.0 Y\n");
    }

    #[test]
    fn it_stops_at_max_order() {
        let counter = count_file("testdata/chain.fst.txt", 1);
        assert_eq!(counter.get("X Y"), None);
        assert_eq!(counter.counts().len(), 2);
    }

    #[test]
    fn it_counts_merging_paths() {
        let counter = count_file("testdata/diamond.fst.txt", 3);
        assert_eq!(counter.get("a"), Some(0.5));
        assert_eq!(counter.get("c"), Some(1.0));
        assert_eq!(counter.get("d"), Some(1.0));
        assert_eq!(counter.get("a c"), Some(0.5));
        assert_eq!(counter.get("a c d"), Some(0.5));
        assert_eq!(counter.get("c d"), Some(1.0));
        assert_eq!(counter.get("b c d"), Some(0.5));
    }

    #[test]
    fn it_is_reproducible() {
        let first = written(&count_file("testdata/diamond.fst.txt", 2));
        let second = written(&count_file("testdata/diamond.fst.txt", 2));
        assert_eq!(first, second);
    }

    #[test]
    fn it_rejects_order_zero() {
        assert!(FractionalCounter::new(0).is_err());
    }
}
