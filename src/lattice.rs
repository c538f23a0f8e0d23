use anyhow::Result;
use log::info;
use rustfst::StateId;
use std::collections::{BTreeMap, BTreeSet};
use std::io::prelude::*;

use crate::LmError;

/// An arc as seen from one end: the state at the other end and the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeTr {
    pub state: StateId,
    pub label: String,
}

/// Arcs into and out of a state.
#[derive(Debug, Clone, Default)]
pub struct LatticeNode {
    /// Outgoing arcs, in file order
    pub children: Vec<LatticeTr>,
    /// Incoming arcs, in file order
    pub parents: Vec<LatticeTr>,
}

impl LatticeNode {
    pub fn out_degree(&self) -> usize {
        self.children.len()
    }
}

/// A lattice read from the AT&T text format, keeping only the graph
/// structure and input labels (weights are ignored).
#[derive(Debug, Default)]
pub struct Lattice {
    nodes: BTreeMap<StateId, LatticeNode>,
    finals: BTreeSet<StateId>,
}

impl Lattice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a lattice in text format.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut lattice = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(LmError::from)?;
            let line_no = idx + 1;
            let data: Vec<&str> = line.split_whitespace().collect();
            match data.len() {
                0 => (),
                // Final state, possibly with a weight
                1 | 2 => {
                    let state = parse_state(data[0], line_no, &line)?;
                    lattice.finals.insert(state);
                }
                _ => {
                    let from = parse_state(data[0], line_no, &line)?;
                    let to = parse_state(data[1], line_no, &line)?;
                    lattice.add_tr(from, to, data[2]);
                }
            }
        }
        info!(
            "read lattice with {} states and {} final states",
            lattice.nodes.len(),
            lattice.finals.len()
        );
        Ok(lattice)
    }

    /// Add an arc, creating its states if needed.
    pub fn add_tr(&mut self, from: StateId, to: StateId, label: &str) {
        self.nodes.entry(from).or_default().children.push(LatticeTr {
            state: to,
            label: label.to_string(),
        });
        self.nodes.entry(to).or_default().parents.push(LatticeTr {
            state: from,
            label: label.to_string(),
        });
    }

    pub fn set_final(&mut self, state: StateId) {
        self.finals.insert(state);
    }

    pub fn node(&self, state: StateId) -> Option<&LatticeNode> {
        self.nodes.get(&state)
    }

    /// All states with their arcs, in increasing order.
    pub fn nodes(&self) -> impl Iterator<Item = (StateId, &LatticeNode)> {
        self.nodes.iter().map(|(&state, node)| (state, node))
    }

    pub fn finals(&self) -> &BTreeSet<StateId> {
        &self.finals
    }

    pub fn num_states(&self) -> usize {
        self.nodes.len()
    }
}

fn parse_state(tok: &str, line_no: usize, line: &str) -> Result<StateId> {
    tok.parse::<StateId>()
        .map_err(|_| LmError::malformed(line_no, "invalid state", line).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufReader;

    #[test]
    fn it_reads_lattices() {
        let fh = File::open("testdata/branch.fst.txt").unwrap();
        let lattice = Lattice::read(BufReader::new(fh)).unwrap();
        assert_eq!(lattice.num_states(), 3);
        assert_eq!(lattice.finals().iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        let start = lattice.node(0).unwrap();
        assert!(start.parents.is_empty());
        assert_eq!(start.out_degree(), 2);
        assert_eq!(
            start.children[1],
            LatticeTr {
                state: 2,
                label: "B".to_string()
            }
        );
        assert_eq!(
            lattice.node(1).unwrap().parents,
            vec![LatticeTr {
                state: 0,
                label: "A".to_string()
            }]
        );
    }

    #[test]
    fn it_reads_final_weights() {
        let lattice = Lattice::read("0 1 a a 0.5\n1 0.25\n\n".as_bytes()).unwrap();
        assert!(lattice.finals().contains(&1));
        assert_eq!(lattice.num_states(), 2);
    }

    #[test]
    fn it_ignores_lone_finals() {
        let lattice = Lattice::read("0 1 a\n7\n".as_bytes()).unwrap();
        assert!(lattice.finals().contains(&7));
        assert!(lattice.node(7).is_none());
    }

    #[test]
    fn it_rejects_bad_states() {
        let err = Lattice::read("0 1 a\nx 2 b\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::MalformedInput { line_no: 2, .. })
        ));
    }
}
