// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;

use bio_types::genome;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub mod vcf;

/// Facing direction of a breakend. `Right` means that at this position
/// the rearranged sequence continues rightward: the left side of the
/// position is severed from the right, and the junction attaches at the
/// right end of the retained interval. `Left` is the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Left,
}

impl Direction {
    pub fn flip(&self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

/// One half of a junction: a position with a facing direction, plus the
/// coordinates its mate asserts. Mates are linked by stable string
/// identifiers rather than references; lookup by id is O(1) via
/// `BreakendSet`.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Breakend {
    #[builder(setter(into))]
    pub id: String,
    #[builder(setter(into))]
    pub contig: String,
    /// 1-based position.
    pub pos: u64,
    pub direction: Direction,
    #[builder(default, setter(into, strip_option))]
    pub mate_id: Option<String>,
    #[builder(setter(into))]
    pub mate_contig: String,
    pub mate_pos: u64,
    pub mate_direction: Direction,
    #[builder(default, setter(into, strip_option))]
    pub event: Option<String>,
    /// Junction copy number, if annotated.
    #[builder(default, setter(strip_option))]
    pub jcn: Option<f64>,
    #[builder(default, setter(strip_option))]
    pub jcn_uncertainty: Option<f64>,
}

impl Breakend {
    pub fn locus(&self) -> genome::Locus {
        genome::Locus::new(self.contig.clone(), self.pos)
    }

    pub fn mate_locus(&self) -> genome::Locus {
        genome::Locus::new(self.mate_contig.clone(), self.mate_pos)
    }
}

/// An owned, sort-stabilized collection of breakends.
///
/// Breakends are kept sorted by `(contig, pos, id)` so that every
/// downstream step iterates in a deterministic order that is independent
/// of input order. Duplicate ids are dropped (first occurrence wins).
#[derive(Debug, Clone, Default)]
pub struct BreakendSet {
    breakends: Vec<Breakend>,
    by_id: HashMap<String, usize>,
    mates: Vec<Option<usize>>,
}

impl BreakendSet {
    pub fn new(mut breakends: Vec<Breakend>) -> Self {
        breakends.sort_by(|a, b| {
            (a.contig.as_str(), a.pos, a.id.as_str()).cmp(&(b.contig.as_str(), b.pos, b.id.as_str()))
        });

        let mut by_id = HashMap::new();
        let mut unique = Vec::with_capacity(breakends.len());
        for breakend in breakends {
            if by_id.contains_key(&breakend.id) {
                warn!("dropping breakend with duplicate id {}", breakend.id);
                continue;
            }
            by_id.insert(breakend.id.clone(), unique.len());
            unique.push(breakend);
        }

        let mates = Self::resolve_mates(&unique, &by_id);

        BreakendSet {
            breakends: unique,
            by_id,
            mates,
        }
    }

    /// Resolve each breakend's mate to an index. A given `mate_id` is
    /// authoritative: if it does not name a known breakend, the mate
    /// stays unresolved. Without a `mate_id`, the unique breakend at the
    /// asserted mate coordinates whose own mate coordinates point back
    /// is taken; any ambiguity leaves the mate unresolved.
    fn resolve_mates(breakends: &[Breakend], by_id: &HashMap<String, usize>) -> Vec<Option<usize>> {
        breakends
            .iter()
            .enumerate()
            .map(|(i, breakend)| match breakend.mate_id {
                Some(ref mate_id) => {
                    let mate = by_id.get(mate_id).copied().filter(|&j| j != i);
                    if mate.is_none() {
                        debug!(
                            "breakend {}: mate id {} does not resolve, leaving unpaired",
                            breakend.id, mate_id
                        );
                    }
                    mate
                }
                None => {
                    let locus = breakend.locus();
                    let mate_locus = breakend.mate_locus();
                    let mut candidates = breakends.iter().enumerate().filter(|(j, other)| {
                        *j != i && other.locus() == mate_locus && other.mate_locus() == locus
                    });
                    match (candidates.next(), candidates.next()) {
                        (Some((j, _)), None) => Some(j),
                        _ => None,
                    }
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.breakends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakends.is_empty()
    }

    pub fn get(&self, i: usize) -> &Breakend {
        &self.breakends[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakend> {
        self.breakends.iter()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Index of the resolved mate of breakend `i`, if any.
    pub fn mate_of(&self, i: usize) -> Option<usize> {
        self.mates[i]
    }

    pub fn are_mates(&self, i: usize, j: usize) -> bool {
        self.mates[i] == Some(j) || self.mates[j] == Some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakend(id: &str, contig: &str, pos: u64, direction: Direction) -> BreakendBuilder {
        let mut builder = BreakendBuilder::default();
        builder
            .id(id)
            .contig(contig)
            .pos(pos)
            .direction(direction)
            .mate_contig(contig)
            .mate_pos(pos)
            .mate_direction(direction.flip());
        builder
    }

    #[test]
    fn test_sort_stabilized_order() {
        let set = BreakendSet::new(vec![
            breakend("b", "chr2", 500, Direction::Left).build().unwrap(),
            breakend("a", "chr1", 2000, Direction::Left).build().unwrap(),
            breakend("c", "chr1", 1000, Direction::Right).build().unwrap(),
        ]);
        let ids: Vec<_> = set.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_mate_resolution_by_id() {
        let set = BreakendSet::new(vec![
            breakend("a", "chr1", 1000, Direction::Right)
                .mate_id("b")
                .mate_pos(2000)
                .build()
                .unwrap(),
            breakend("b", "chr1", 2000, Direction::Left)
                .mate_id("a")
                .mate_pos(1000)
                .build()
                .unwrap(),
        ]);
        assert_eq!(set.mate_of(0), Some(1));
        assert_eq!(set.mate_of(1), Some(0));
        assert!(set.are_mates(0, 1));
        assert_eq!(set.index_of("a"), Some(0));
        assert_eq!(set.index_of("b"), Some(1));
        assert_eq!(set.index_of("ghost"), None);
    }

    #[test]
    fn test_dangling_mate_id_stays_unresolved() {
        let set = BreakendSet::new(vec![breakend("a", "chr1", 1000, Direction::Right)
            .mate_id("missing")
            .mate_pos(2000)
            .build()
            .unwrap()]);
        assert_eq!(set.mate_of(0), None);
    }

    #[test]
    fn test_mate_resolution_by_position() {
        // No mate ids given: the unique back-pointing candidate is taken.
        let set = BreakendSet::new(vec![
            breakend("a", "chr1", 1000, Direction::Right).mate_pos(2000).build().unwrap(),
            breakend("b", "chr1", 2000, Direction::Left).mate_pos(1000).build().unwrap(),
        ]);
        assert_eq!(set.mate_of(0), Some(1));
        assert_eq!(set.mate_of(1), Some(0));
    }

    #[test]
    fn test_ambiguous_position_match_stays_unresolved() {
        let set = BreakendSet::new(vec![
            breakend("a", "chr1", 1000, Direction::Right).mate_pos(2000).build().unwrap(),
            breakend("b", "chr1", 2000, Direction::Left).mate_pos(1000).build().unwrap(),
            breakend("c", "chr1", 2000, Direction::Right).mate_pos(1000).build().unwrap(),
        ]);
        // Both b and c point back at a.
        assert_eq!(set.mate_of(0), None);
    }
}
