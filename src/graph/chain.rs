// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Greedy chaining of breakends from prioritized candidate links.
//!
//! The engine complements the walker on ambiguous input: it seeds one
//! partial chain per SV edge and repeatedly extends or merges chains by
//! the highest-scoring still-applicable templated-insertion edge.

use std::collections::VecDeque;

use ordered_float::NotNan;
use serde::Serialize;

use crate::breakends::{Breakend, BreakendSet, Direction};
use crate::chains::{Chain, ChainEnd, Orientation, WalkSegment};
use crate::graph::Link;

/// Priority class of a templated-insertion edge, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LinkPriority {
    /// One or both endpoints appear in exactly one candidate TI edge.
    Only,
    /// No other breakend lies between the endpoints on their contig.
    Adjacent,
    /// Both endpoints carry a JCN and the values agree within their
    /// combined uncertainty.
    JcnMatch,
    Nearest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLink {
    pub link: Link,
    pub priority: LinkPriority,
    pub score: NotNan<f64>,
}

const DEFAULT_JCN_UNCERTAINTY: f64 = 0.5;

/// Assign each TI edge its priority class and tie-break score.
pub fn score_links(set: &BreakendSet, templated_insertions: &[Link]) -> Vec<ScoredLink> {
    let mut incidence = vec![0usize; set.len()];
    for link in templated_insertions {
        incidence[link.a] += 1;
        incidence[link.b] += 1;
    }

    templated_insertions
        .iter()
        .map(|link| {
            let a = set.get(link.a);
            let b = set.get(link.b);
            let priority = if incidence[link.a] == 1 || incidence[link.b] == 1 {
                LinkPriority::Only
            } else if is_adjacent(set, a, b) {
                LinkPriority::Adjacent
            } else if jcn_matches(a, b) {
                LinkPriority::JcnMatch
            } else {
                LinkPriority::Nearest
            };
            let score = match priority {
                LinkPriority::Only => 4.0,
                LinkPriority::Adjacent => 3.0,
                LinkPriority::JcnMatch => 2.0,
                LinkPriority::Nearest => {
                    let distance = a.pos.abs_diff(b.pos) as f64;
                    1.0 / (1.0 + distance)
                }
            };
            ScoredLink {
                link: *link,
                priority,
                score: NotNan::new(score).unwrap(),
            }
        })
        .collect()
}

fn is_adjacent(set: &BreakendSet, a: &Breakend, b: &Breakend) -> bool {
    let (lo, hi) = if a.pos <= b.pos { (a.pos, b.pos) } else { (b.pos, a.pos) };
    !set.iter()
        .any(|other| other.contig == a.contig && other.pos > lo && other.pos < hi)
}

fn jcn_matches(a: &Breakend, b: &Breakend) -> bool {
    match (a.jcn, b.jcn) {
        (Some(jcn_a), Some(jcn_b)) => {
            let uncertainty = a.jcn_uncertainty.unwrap_or(DEFAULT_JCN_UNCERTAINTY)
                + b.jcn_uncertainty.unwrap_or(DEFAULT_JCN_UNCERTAINTY);
            (jcn_a - jcn_b).abs() < uncertainty.max(DEFAULT_JCN_UNCERTAINTY)
        }
        _ => false,
    }
}

/// Result of the chaining path: the assembled chains plus the
/// informational cluster partition (lists of breakend ids).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub chains: Vec<Chain>,
    pub clusters: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct PartialChain {
    segments: VecDeque<WalkSegment>,
    /// Open-end breakend index at the front of `segments`.
    head: usize,
    /// Open-end breakend index at the back.
    tail: usize,
}

impl PartialChain {
    fn seed(link: &Link) -> Self {
        PartialChain {
            segments: VecDeque::new(),
            head: link.a,
            tail: link.b,
        }
    }

    fn matches(&self, breakend: usize) -> bool {
        self.head == breakend || self.tail == breakend
    }

    fn reverse(&mut self) {
        std::mem::swap(&mut self.head, &mut self.tail);
        self.segments = std::mem::take(&mut self.segments)
            .into_iter()
            .rev()
            .map(|mut segment| {
                segment.orientation = segment.orientation.flip();
                segment
            })
            .collect();
    }
}

/// Assemble chains: seed one per SV edge, then repeatedly apply the
/// highest-scoring TI edge that can splice two chains or extend one,
/// until a full pass applies nothing.
pub fn assemble_chains(set: &BreakendSet, sv: &[Link], scored: &[ScoredLink]) -> Vec<Chain> {
    let mut chains: Vec<Option<PartialChain>> =
        sv.iter().map(|link| Some(PartialChain::seed(link))).collect();
    let mut used = vec![false; set.len()];
    let mut consumed = vec![false; scored.len()];

    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&i, &j| scored[j].score.cmp(&scored[i].score).then(i.cmp(&j)));

    loop {
        let mut applied = false;
        for &e in &order {
            if consumed[e] {
                continue;
            }
            let link = scored[e].link;
            let (x, y) = (link.a, link.b);
            if used[x] && used[y] {
                continue;
            }

            let chain_x = find_chain(&chains, x);
            let chain_y = find_chain(&chains, y);
            match (chain_x, chain_y) {
                (Some(i), Some(j)) if i != j => {
                    splice(set, &mut chains, i, j, x, y);
                    used[x] = true;
                    used[y] = true;
                }
                // Both ends belong to the same chain: splicing would
                // fold the chain onto itself, skip.
                (Some(_), Some(_)) => continue,
                (Some(i), None) => {
                    if used[y] {
                        continue;
                    }
                    append(set, &mut chains, i, x, y);
                    used[x] = true;
                }
                (None, Some(j)) => {
                    if used[x] {
                        continue;
                    }
                    append(set, &mut chains, j, y, x);
                    used[y] = true;
                }
                (None, None) => continue,
            }
            consumed[e] = true;
            applied = true;
            break;
        }
        if !applied {
            break;
        }
    }

    chains
        .into_iter()
        .flatten()
        .map(|partial| finish(set, partial))
        .collect()
}

fn find_chain(chains: &[Option<PartialChain>], breakend: usize) -> Option<usize> {
    chains
        .iter()
        .position(|chain| chain.as_ref().map_or(false, |c| c.matches(breakend)))
}

/// The reference interval a TI edge splices into a chain. On one contig
/// this is the spanned interval, emitted REVERSE for a DB-shaped pair
/// (lower end facing RIGHT, upper facing LEFT); across contigs a point
/// segment at the appended endpoint.
fn spliced_segment(set: &BreakendSet, x: usize, y: usize) -> WalkSegment {
    let (a, b) = (set.get(x), set.get(y));
    let (lower, upper) = if (a.contig.as_str(), a.pos) <= (b.contig.as_str(), b.pos) {
        (a, b)
    } else {
        (b, a)
    };
    if lower.contig == upper.contig {
        let orientation =
            if lower.direction == Direction::Right && upper.direction == Direction::Left {
                Orientation::Reverse
            } else {
                Orientation::Forward
            };
        WalkSegment {
            ref_index: None,
            contig: lower.contig.clone(),
            start: lower.pos,
            end: upper.pos,
            orientation,
        }
    } else {
        let at = set.get(y);
        WalkSegment {
            ref_index: None,
            contig: at.contig.clone(),
            start: at.pos,
            end: at.pos,
            orientation: Orientation::Forward,
        }
    }
}

/// Splice the chain ending in `x` with the chain ending in `y` into one,
/// absorbing both endpoints as interior breakends.
fn splice(set: &BreakendSet, chains: &mut [Option<PartialChain>], i: usize, j: usize, x: usize, y: usize) {
    let segment = spliced_segment(set, x, y);
    let mut left = chains[i].take().unwrap();
    if left.head == x {
        left.reverse();
    }
    let mut right = chains[j].take().unwrap();
    if right.tail == y {
        right.reverse();
    }
    left.segments.push_back(segment);
    left.segments.extend(right.segments);
    left.tail = right.tail;
    chains[i] = Some(left);
}

/// Append a TI edge to the chain end `x`; `y` becomes the new open end.
fn append(set: &BreakendSet, chains: &mut [Option<PartialChain>], i: usize, x: usize, y: usize) {
    let segment = spliced_segment(set, x, y);
    let mut chain = chains[i].take().unwrap();
    if chain.head == x {
        chain.reverse();
    }
    chain.segments.push_back(segment);
    chain.tail = y;
    chains[i] = Some(chain);
}

fn finish(set: &BreakendSet, partial: PartialChain) -> Chain {
    let end = |breakend: &Breakend| ChainEnd {
        contig: breakend.contig.clone(),
        pos: breakend.pos,
        direction: breakend.direction,
        id: Some(breakend.id.clone()),
    };
    let head = set.get(partial.head);
    let tail = set.get(partial.tail);
    let is_closed = head.id == tail.id;
    Chain {
        segments: partial.segments.into_iter().collect(),
        ends: if is_closed {
            Vec::new()
        } else {
            vec![end(head), end(tail)]
        },
        is_closed,
    }
}
