use anyhow::{anyhow, Result};
use log::debug;
use rustfst::StateId;
use std::collections::HashMap;

use crate::lattice::Lattice;
use crate::LmError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    /// Some parents are not done yet
    InProgress,
    Done(f64),
}

/// Occupancy probability of every state in a lattice, assuming that
/// all arcs leaving a state are equally likely.
///
/// A state with no incoming arcs has occupancy 1.  Otherwise it is the
/// sum over its incoming arcs of the occupancy of the origin divided by
/// the number of arcs leaving the origin.
#[derive(Debug, Default)]
pub struct Occupancy {
    scores: HashMap<StateId, f64>,
}

impl Occupancy {
    /// Compute occupancy for every state.  Fails if the lattice has a
    /// cycle.
    pub fn compute(lattice: &Lattice) -> Result<Self> {
        let mut marks = HashMap::<StateId, Mark>::new();
        // (state, index of next parent to look at)
        let mut stack = Vec::<(StateId, usize)>::new();
        for (root, _) in lattice.nodes() {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            stack.push((root, 0));
            while let Some((state, next)) = stack.last().copied() {
                let node = lattice
                    .node(state)
                    .ok_or_else(|| anyhow!("state {} has an arc but no node", state))?;
                if let Some(parent) = node.parents.get(next) {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match marks.get(&parent.state).copied() {
                        Some(Mark::Done(_)) => (),
                        Some(Mark::InProgress) => {
                            return Err(LmError::StructuralCycle {
                                state: parent.state,
                            }
                            .into())
                        }
                        None => {
                            marks.insert(parent.state, Mark::InProgress);
                            stack.push((parent.state, 0));
                        }
                    }
                    continue;
                }
                // All parents are done
                let mut score = if node.parents.is_empty() { 1.0 } else { 0.0 };
                for parent in node.parents.iter() {
                    let origin = lattice
                        .node(parent.state)
                        .ok_or_else(|| anyhow!("state {} has an arc but no node", parent.state))?;
                    if let Some(Mark::Done(parent_score)) = marks.get(&parent.state) {
                        score += parent_score / origin.out_degree() as f64;
                    }
                }
                marks.insert(state, Mark::Done(score));
                stack.pop();
            }
        }
        let scores: HashMap<StateId, f64> = marks
            .into_iter()
            .filter_map(|(state, mark)| match mark {
                Mark::Done(score) => Some((state, score)),
                Mark::InProgress => None,
            })
            .collect();
        debug!("computed occupancy for {} states", scores.len());
        Ok(Self { scores })
    }

    /// Occupancy of a state (0 if it is not in the lattice).
    pub fn get(&self, state: StateId) -> f64 {
        self.scores.get(&state).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufReader;

    fn read(path: &str) -> Lattice {
        Lattice::read(BufReader::new(File::open(path).unwrap())).unwrap()
    }

    #[test]
    fn it_splits_branches() {
        let occ = Occupancy::compute(&read("testdata/branch.fst.txt")).unwrap();
        assert_eq!(occ.get(0), 1.0);
        assert_eq!(occ.get(1), 0.5);
        assert_eq!(occ.get(2), 0.5);
    }

    #[test]
    fn it_follows_chains() {
        let occ = Occupancy::compute(&read("testdata/chain.fst.txt")).unwrap();
        assert_eq!(occ.len(), 3);
        for state in 0..3 {
            assert_eq!(occ.get(state), 1.0);
        }
    }

    #[test]
    fn it_merges_paths() {
        let occ = Occupancy::compute(&read("testdata/diamond.fst.txt")).unwrap();
        assert_eq!(occ.get(1), 0.5);
        assert_eq!(occ.get(3), 1.0);
        assert_eq!(occ.get(4), 1.0);
    }

    #[test]
    fn it_handles_out_of_order_states() {
        // Parents are numbered after their children
        let mut lattice = Lattice::new();
        lattice.add_tr(5, 1, "a");
        lattice.add_tr(5, 2, "b");
        lattice.add_tr(1, 0, "c");
        lattice.set_final(0);
        let occ = Occupancy::compute(&lattice).unwrap();
        assert_eq!(occ.get(5), 1.0);
        assert_eq!(occ.get(0), 0.5);
    }

    #[test]
    fn it_gives_roots_full_occupancy() {
        // Two disconnected pieces each have their own root
        let mut lattice = Lattice::new();
        lattice.add_tr(0, 1, "a");
        lattice.add_tr(7, 8, "b");
        let occ = Occupancy::compute(&lattice).unwrap();
        assert_eq!(occ.get(0), 1.0);
        assert_eq!(occ.get(7), 1.0);
        assert_eq!(occ.get(8), 1.0);
    }

    #[test]
    fn it_detects_cycles() {
        let mut lattice = Lattice::new();
        lattice.add_tr(0, 1, "a");
        lattice.add_tr(1, 2, "b");
        lattice.add_tr(2, 1, "c");
        let err = Occupancy::compute(&lattice).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::StructuralCycle { .. })
        ));
    }

    #[test]
    fn it_detects_self_loops() {
        let mut lattice = Lattice::new();
        lattice.add_tr(0, 1, "a");
        lattice.add_tr(1, 1, "b");
        let err = Occupancy::compute(&lattice).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::StructuralCycle { state: 1 })
        ));
    }
}
