// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Deterministic reconstruction of derivative chromosomes via a
//! port-based segment graph.
//!
//! Each contig is partitioned into reference segments at its breakend
//! positions (plus synthetic left/right stubs). Every segment has a
//! LEFT and a RIGHT port; each boundary between consecutive segments
//! owns two half-edges (the R-port of the left segment and the L-port
//! of the right segment). A junction diverts a half-edge from its
//! reference neighbor to a remote port; boundaries without a junction
//! keep the reference adjacency. Derivative chromosomes then fall out
//! as port traversals, without any heuristic search.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::breakends::{Breakend, BreakendSet, Direction};
use crate::chains::{Chain, Orientation, WalkSegment};

/// Length of the synthetic stub segment appended after the last breakend
/// position of a contig.
pub const SEGMENT_PAD: u64 = 1000;

/// A contiguous reference interval between adjacent breakend positions,
/// half-open, with a globally unique dense index (lexicographic contig
/// order, ascending coordinates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefSegment {
    pub index: usize,
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

// Ports are kept in a flat array indexed by `2 * segment + side`.
fn port(segment: usize, side: Side) -> usize {
    2 * segment
        + match side {
            Side::Left => 0,
            Side::Right => 1,
        }
}

fn port_segment(port: usize) -> usize {
    port / 2
}

fn port_side(port: usize) -> Side {
    if port % 2 == 0 {
        Side::Left
    } else {
        Side::Right
    }
}

fn opposite(p: usize) -> usize {
    p ^ 1
}

/// State of a segment port.
///
/// `Free` ports are the open ends of derivative chromosomes: contig
/// stubs, and severed ports whose mate did not resolve. `Sealed` marks
/// the abandoned side of a boundary that was severed only from the other
/// side; a sealed port neither seeds nor continues a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortState {
    Free,
    Sealed,
    Connected(usize),
}

/// Result of the walker: derivative chains, indices of reference
/// segments never entered by any walk, and the segmentation itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconstruction {
    pub chains: Vec<Chain>,
    pub orphan_indices: Vec<usize>,
    pub ref_segments: Vec<RefSegment>,
}

pub struct SegmentGraph {
    segments: Vec<RefSegment>,
    ports: Vec<PortState>,
    /// Per contig: global index of its first segment and its sorted
    /// distinct breakend positions.
    contigs: BTreeMap<String, (usize, Vec<u64>)>,
}

impl SegmentGraph {
    pub fn build(set: &BreakendSet) -> Self {
        let mut positions: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for breakend in set.iter() {
            positions.entry(&breakend.contig).or_default().push(breakend.pos);
        }

        let mut segments = Vec::new();
        let mut contigs = BTreeMap::new();
        for (contig, mut contig_positions) in positions {
            contig_positions.sort_unstable();
            contig_positions.dedup();

            let first = segments.len();
            let mut boundaries = Vec::with_capacity(contig_positions.len() + 2);
            boundaries.push(0);
            boundaries.extend(&contig_positions);
            boundaries.push(contig_positions.last().unwrap() + SEGMENT_PAD);
            for window in boundaries.windows(2) {
                segments.push(RefSegment {
                    index: segments.len(),
                    contig: contig.to_owned(),
                    start: window[0],
                    end: window[1],
                });
            }
            contigs.insert(contig.to_owned(), (first, contig_positions));
        }

        let ports = vec![PortState::Free; 2 * segments.len()];
        let mut graph = SegmentGraph {
            segments,
            ports,
            contigs,
        };
        graph.wire(set);
        graph
    }

    /// The port a breakend maps to: a `Right`-facing breakend maps to
    /// the RIGHT port of the segment ending at its position, a
    /// `Left`-facing one to the LEFT port of the segment starting there.
    fn breakend_port(&self, breakend: &Breakend) -> Option<usize> {
        let (first, positions) = self.contigs.get(&breakend.contig)?;
        let rank = positions.binary_search(&breakend.pos).ok()?;
        Some(match breakend.direction {
            Direction::Right => port(first + rank, Side::Right),
            Direction::Left => port(first + rank + 1, Side::Left),
        })
    }

    fn wire(&mut self, set: &BreakendSet) {
        // Breakends grouped per boundary; set order makes each group
        // id-sorted, which fixes the winner of any wiring conflict.
        let mut at_boundary: HashMap<(&str, u64), Vec<usize>> = HashMap::new();
        for (i, breakend) in set.iter().enumerate() {
            at_boundary
                .entry((breakend.contig.as_str(), breakend.pos))
                .or_default()
                .push(i);
        }

        let contigs: Vec<(String, usize, Vec<u64>)> = self
            .contigs
            .iter()
            .map(|(contig, (first, positions))| (contig.clone(), *first, positions.clone()))
            .collect();

        for (contig, first, positions) in contigs {
            for (rank, &boundary) in positions.iter().enumerate() {
                let left_r = port(first + rank, Side::Right);
                let right_l = port(first + rank + 1, Side::Left);

                let empty = Vec::new();
                let here = at_boundary
                    .get(&(contig.as_str(), boundary))
                    .unwrap_or(&empty);
                let right_facing: Vec<usize> = here
                    .iter()
                    .copied()
                    .filter(|&i| set.get(i).direction == Direction::Right)
                    .collect();
                let left_facing: Vec<usize> = here
                    .iter()
                    .copied()
                    .filter(|&i| set.get(i).direction == Direction::Left)
                    .collect();

                if right_facing.is_empty() && left_facing.is_empty() {
                    // Reference adjacency persists across the boundary.
                    self.connect(left_r, right_l);
                    continue;
                }

                self.sever(set, left_r, &right_facing, &left_facing);
                self.sever(set, right_l, &left_facing, &right_facing);
            }
        }
    }

    /// Sever one side of a boundary. `severing` holds the breakends that
    /// divert this port to their mate (first one by id wins), `other`
    /// the breakends severing only the opposite side.
    fn sever(&mut self, set: &BreakendSet, p: usize, severing: &[usize], other: &[usize]) {
        match severing.first() {
            Some(&i) => {
                for &extra in &severing[1..] {
                    debug!(
                        "breakend {} maps to an already severed port, ignoring",
                        set.get(extra).id
                    );
                }
                let target = set
                    .mate_of(i)
                    .and_then(|mate| self.breakend_port(set.get(mate)));
                match target {
                    Some(q) => self.connect(p, q),
                    // Unresolved mate: the severed port stays free and
                    // becomes an open chain end.
                    None => debug!(
                        "breakend {} has no resolvable mate port, leaving port free",
                        set.get(i).id
                    ),
                }
            }
            None => {
                debug_assert!(!other.is_empty());
                // The boundary is broken from the other side only; this
                // port is abandoned by the rearrangement.
                self.ports[p] = PortState::Sealed;
            }
        }
    }

    fn connect(&mut self, p: usize, q: usize) {
        if p == q {
            debug!("ignoring self-connection of port {}", p);
            return;
        }
        match (self.ports[p], self.ports[q]) {
            (PortState::Free, PortState::Free) => {
                self.ports[p] = PortState::Connected(q);
                self.ports[q] = PortState::Connected(p);
            }
            (PortState::Connected(x), _) if x == q => (),
            _ => {
                debug!("port conflict between {} and {}", p, q);
                if self.ports[p] == PortState::Free {
                    self.ports[p] = PortState::Sealed;
                }
                if self.ports[q] == PortState::Free {
                    self.ports[q] = PortState::Sealed;
                }
            }
        }
    }

    /// Traverse the port graph. Free ports seed open chains (all LEFT
    /// ports first, then RIGHT ports, each by ascending segment index);
    /// leftover segments are probed for closed loops, and anything else
    /// is an orphan.
    pub fn walk(&self) -> Reconstruction {
        let n = self.segments.len();
        let mut entered = vec![false; n];
        let mut chains = Vec::new();

        for side in [Side::Left, Side::Right] {
            for segment in 0..n {
                let start = port(segment, side);
                if self.ports[start] != PortState::Free {
                    continue;
                }
                if let Some(chain) = self.walk_open(start, &mut entered) {
                    chains.push(chain);
                }
            }
        }

        let mut orphan_indices = Vec::new();
        for segment in 0..n {
            if entered[segment] {
                continue;
            }
            if let Some(cycle) = self.walk_cycle(segment, &mut entered) {
                chains.push(cycle);
            } else {
                orphan_indices.push(segment);
            }
        }

        Reconstruction {
            chains,
            orphan_indices,
            ref_segments: self.segments.clone(),
        }
    }

    fn walk_open(&self, start: usize, entered: &mut [bool]) -> Option<Chain> {
        let mut segments = Vec::new();
        let mut current = start;
        loop {
            let segment = port_segment(current);
            if entered[segment] {
                break;
            }
            entered[segment] = true;
            segments.push(self.walk_segment(current));
            match self.ports[opposite(current)] {
                PortState::Connected(next) => current = next,
                _ => break,
            }
        }
        if segments.is_empty() {
            None
        } else {
            Some(Chain {
                segments,
                ends: Vec::new(),
                is_closed: false,
            })
        }
    }

    /// Probe for a cycle through `segment`, entering at its LEFT port.
    /// Only a traversal that returns to its starting port is a closed
    /// loop; everything else leaves the segment an orphan.
    fn walk_cycle(&self, segment: usize, entered: &mut [bool]) -> Option<Chain> {
        let start = port(segment, Side::Left);
        let mut visited = Vec::new();
        let mut segments = Vec::new();
        let mut current = start;
        loop {
            let here = port_segment(current);
            if visited.contains(&here) {
                return None;
            }
            visited.push(here);
            segments.push(self.walk_segment(current));
            match self.ports[opposite(current)] {
                PortState::Connected(next) if next == start => break,
                PortState::Connected(next) => current = next,
                _ => return None,
            }
        }
        for &here in &visited {
            entered[here] = true;
        }
        Some(Chain {
            segments,
            ends: Vec::new(),
            is_closed: true,
        })
    }

    fn walk_segment(&self, entry: usize) -> WalkSegment {
        let segment = &self.segments[port_segment(entry)];
        WalkSegment {
            ref_index: Some(segment.index),
            contig: segment.contig.clone(),
            start: segment.start,
            end: segment.end,
            orientation: match port_side(entry) {
                Side::Left => Orientation::Forward,
                Side::Right => Orientation::Reverse,
            },
        }
    }
}

/// Reconstruct derivative chromosomes deterministically from a breakend
/// set.
pub fn reconstruct(set: &BreakendSet) -> Reconstruction {
    if set.is_empty() {
        return Reconstruction {
            chains: Vec::new(),
            orphan_indices: Vec::new(),
            ref_segments: Vec::new(),
        };
    }
    SegmentGraph::build(set).walk()
}
