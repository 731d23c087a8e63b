use bitvec::prelude::*;
use fixedbitset::FixedBitSet;

use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, VInt};

/// Binary label per node: bit 0 marks a separation node, bit 1 a community member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classification {
    bits: BitVec<usize, Lsb0>,
}

impl Classification {
    /// Every node is a separator, the all-zero state.
    pub fn all_separators(node_count: usize) -> Classification {
        Classification {
            bits: bitvec![usize, Lsb0; 0; node_count],
        }
    }

    pub fn all_members(node_count: usize) -> Classification {
        Classification {
            bits: bitvec![usize, Lsb0; 1; node_count],
        }
    }

    /// Every node is a member except the listed separators.
    pub fn from_separators(node_count: usize, separators: &[VInt]) -> Classification {
        let mut classification = Self::all_members(node_count);
        for &vertex in separators {
            classification.set_separator(vertex, true);
        }
        classification
    }

    /// Build from raw states, `true` meaning member.
    pub fn from_states(states: impl IntoIterator<Item = bool>) -> Classification {
        Classification {
            bits: states.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn is_separator(&self, vertex: VInt) -> bool {
        !self.bits[vertex as usize]
    }

    /// The 0/1 value of a node.
    #[inline]
    pub fn value(&self, vertex: VInt) -> u8 {
        self.bits[vertex as usize] as u8
    }

    pub fn set_separator(&mut self, vertex: VInt, separator: bool) {
        self.bits.set(vertex as usize, !separator);
    }

    pub fn flip(&mut self, vertex: VInt) {
        let current = self.bits[vertex as usize];
        self.bits.set(vertex as usize, !current);
    }

    pub fn separators(&self) -> Vec<VInt> {
        self.bits.iter_zeros().map(|idx| idx as VInt).collect()
    }

    pub fn separator_count(&self) -> usize {
        self.bits.count_zeros()
    }

    /// Mask of the non-separator nodes.
    pub fn member_mask(&self) -> FixedBitSet {
        let mut mask = FixedBitSet::with_capacity(self.bits.len());
        for idx in self.bits.iter_ones() {
            mask.insert(idx);
        }
        mask
    }

    /// Member states as a slice, `true` meaning member.
    pub fn states(&self) -> &BitSlice<usize, Lsb0> {
        &self.bits
    }

    /// Ensure this classification labels exactly the nodes of `graph`.
    pub(crate) fn check_domain(&self, graph: &Graph) -> Result<()> {
        if self.len() != graph.v_size() {
            return Err(SepNodeError::ClassificationSize {
                expected: graph.v_size(),
                found: self.len(),
            });
        }
        Ok(())
    }
}
