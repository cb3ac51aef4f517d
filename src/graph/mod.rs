// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeSet;

use derive_new::new;
use itertools::Itertools;
use serde::Serialize;

use crate::breakends::{BreakendSet, Direction};

pub mod chain;
pub mod walk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    Sv,
    TemplatedInsertion,
    DeletionBridge,
}

/// An undirected edge between two breakends, given as indices into the
/// owning `BreakendSet` with `a < b` in set order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new, Serialize)]
pub struct Link {
    pub kind: LinkKind,
    pub a: usize,
    pub b: usize,
}

/// The three edge sets derived from a breakend set.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    /// One edge per resolved mate pair.
    pub sv: Vec<Link>,
    /// Same-contig non-mate pairs facing inward (interval retained).
    pub templated_insertions: Vec<Link>,
    /// Same-contig non-mate pairs facing outward (interval lost).
    pub deletion_bridges: Vec<Link>,
}

/// Enumerate SV, TI and DB edges. Tolerates dangling mates (they simply
/// contribute no SV edge); output order is deterministic given the
/// sort-stabilized breakend set.
pub fn build_links(set: &BreakendSet) -> LinkSet {
    let mut links = LinkSet::default();

    let mut seen = BTreeSet::new();
    for i in 0..set.len() {
        if let Some(j) = set.mate_of(i) {
            let pair = (i.min(j), i.max(j));
            if seen.insert(pair) {
                links.sv.push(Link::new(LinkKind::Sv, pair.0, pair.1));
            }
        }
    }

    for (_, group) in &set
        .iter()
        .enumerate()
        .group_by(|(_, breakend)| breakend.contig.clone())
    {
        let indices: Vec<usize> = group.map(|(i, _)| i).collect();
        // Set order sorts by position within a contig, so `a` is always
        // the lower-position endpoint. All pairs are considered, not
        // only adjacent ones.
        for (x, &a) in indices.iter().enumerate() {
            for &b in &indices[x + 1..] {
                if set.are_mates(a, b) {
                    continue;
                }
                match (set.get(a).direction, set.get(b).direction) {
                    (Direction::Left, Direction::Right) => links
                        .templated_insertions
                        .push(Link::new(LinkKind::TemplatedInsertion, a, b)),
                    (Direction::Right, Direction::Left) => links
                        .deletion_bridges
                        .push(Link::new(LinkKind::DeletionBridge, a, b)),
                    _ => (),
                }
            }
        }
    }

    links
}
