// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Copy-number based pruning of templated-insertion edges. A TI edge
//! whose spanned interval carries no rearrangement-attributable copy
//! number cannot be part of a derivative and is dropped before chaining.

use std::collections::HashMap;

use bio::data_structures::interval_tree::ArrayBackedIntervalTree;
use bio_types::genome::{self, AbstractInterval};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::breakends::BreakendSet;
use crate::graph::Link;

pub const DEFAULT_BACKGROUND_PLOIDY: f64 = 2.0;

/// Minimum length-weighted mean of `major + minor - background` for a
/// spanned interval to count as rearranged.
pub(crate) const ZERO_JCN_THRESHOLD: f64 = 0.15;

/// An allele-specific copy-number segment, half-open. Segments may
/// overlap within a contig; overlaps are averaged length-weighted.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct CnSegment {
    #[builder(setter(into))]
    pub contig: String,
    pub start: u64,
    pub end: u64,
    pub major_cn: f64,
    pub minor_cn: f64,
}

impl CnSegment {
    pub fn total_cn(&self) -> f64 {
        self.major_cn + self.minor_cn
    }
}

struct CnIndex<'a> {
    segments: &'a [CnSegment],
    trees: HashMap<&'a str, ArrayBackedIntervalTree<u64, usize>>,
}

impl<'a> CnIndex<'a> {
    fn new(segments: &'a [CnSegment]) -> Self {
        let mut trees: HashMap<&str, ArrayBackedIntervalTree<u64, usize>> = HashMap::new();
        for (i, segment) in segments.iter().enumerate() {
            trees
                .entry(&segment.contig)
                .or_insert_with(ArrayBackedIntervalTree::new)
                .insert(segment.start..segment.end, i);
        }
        for tree in trees.values_mut() {
            tree.index();
        }
        CnIndex { segments, trees }
    }

    /// Length-weighted mean of `total_cn - background` over the overlap
    /// of each copy-number segment with the queried interval, or `None`
    /// if nothing overlaps. Weights are the overlap lengths, not the
    /// segment lengths.
    fn rearrangement_cn(&self, interval: &genome::Interval, background: f64) -> Option<f64> {
        let tree = self.trees.get(interval.contig())?;
        let range = interval.range();
        let mut weighted = 0.0;
        let mut total = 0.0;
        for entry in tree.find(range.clone()) {
            let segment = &self.segments[*entry.data()];
            let overlap = (segment.end.min(range.end) - segment.start.max(range.start)) as f64;
            weighted += (segment.total_cn() - background) * overlap;
            total += overlap;
        }
        if total > 0.0 {
            Some(weighted / total)
        } else {
            None
        }
    }
}

/// Retain a TI edge iff its endpoints are on different contigs, no
/// copy-number segment overlaps the spanned interval, or the interval's
/// rearrangement-attributable copy number reaches the zero-JCN
/// threshold.
pub fn filter_templated_insertions(
    links: Vec<Link>,
    set: &BreakendSet,
    cn_segments: &[CnSegment],
    background_ploidy: f64,
) -> Vec<Link> {
    let index = CnIndex::new(cn_segments);
    let before = links.len();
    let retained: Vec<Link> = links
        .into_iter()
        .filter(|link| {
            let a = set.get(link.a);
            let b = set.get(link.b);
            if a.contig != b.contig {
                return true;
            }
            let lo = a.pos.min(b.pos);
            let hi = a.pos.max(b.pos);
            // The spanned interval is closed, the index half-open.
            let spanned = genome::Interval::new(a.contig.clone(), lo..hi + 1);
            match index.rearrangement_cn(&spanned, background_ploidy) {
                None => true,
                Some(cn) => cn >= ZERO_JCN_THRESHOLD,
            }
        })
        .collect();
    if retained.len() < before {
        debug!(
            "copy-number filter dropped {} of {} TI edges",
            before - retained.len(),
            before
        );
    }
    retained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakends::{Breakend, BreakendBuilder, Direction};
    use crate::graph::LinkKind;

    fn breakend(id: &str, contig: &str, pos: u64, direction: Direction) -> Breakend {
        BreakendBuilder::default()
            .id(id)
            .contig(contig)
            .pos(pos)
            .direction(direction)
            .mate_contig(contig)
            .mate_pos(pos + 10)
            .mate_direction(direction.flip())
            .mate_id("none")
            .build()
            .unwrap()
    }

    fn cn(contig: &str, start: u64, end: u64, major: f64, minor: f64) -> CnSegment {
        CnSegmentBuilder::default()
            .contig(contig)
            .start(start)
            .end(end)
            .major_cn(major)
            .minor_cn(minor)
            .build()
            .unwrap()
    }

    fn ti_set() -> (BreakendSet, Vec<Link>) {
        let set = BreakendSet::new(vec![
            breakend("a", "chr1", 1000, Direction::Left),
            breakend("b", "chr1", 2000, Direction::Right),
        ]);
        let links = vec![Link::new(LinkKind::TemplatedInsertion, 0, 1)];
        (set, links)
    }

    #[test]
    fn test_weighted_mean_over_overlaps() {
        let segments = vec![
            cn("chr1", 0, 1500, 2.0, 1.0), // total 3, overlap 500
            cn("chr1", 1500, 3000, 1.0, 1.0), // total 2, overlap 501
        ];
        let index = CnIndex::new(&segments);
        let mean = index
            .rearrangement_cn(
                &genome::Interval::new("chr1".to_owned(), 1000..2001),
                DEFAULT_BACKGROUND_PLOIDY,
            )
            .unwrap();
        // (1.0 * 500 + 0.0 * 501) / 1001
        approx::assert_relative_eq!(mean, 500.0 / 1001.0, epsilon = 1e-9);
    }

    #[test]
    fn test_edge_retained_when_cn_supports_it() {
        let (set, links) = ti_set();
        let segments = vec![cn("chr1", 0, 3000, 2.0, 1.0)];
        let retained =
            filter_templated_insertions(links, &set, &segments, DEFAULT_BACKGROUND_PLOIDY);
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn test_edge_dropped_at_background_ploidy() {
        let (set, links) = ti_set();
        let segments = vec![cn("chr1", 0, 3000, 1.0, 1.0)];
        let retained =
            filter_templated_insertions(links, &set, &segments, DEFAULT_BACKGROUND_PLOIDY);
        assert!(retained.is_empty());
    }

    #[test]
    fn test_edge_retained_without_overlap() {
        let (set, links) = ti_set();
        let segments = vec![cn("chr2", 0, 3000, 1.0, 1.0), cn("chr1", 5000, 6000, 1.0, 1.0)];
        let retained =
            filter_templated_insertions(links, &set, &segments, DEFAULT_BACKGROUND_PLOIDY);
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn test_low_but_positive_cn_is_retained() {
        let (set, links) = ti_set();
        // total_cn - background = 0.2, just above the zero-JCN threshold.
        let segments = vec![cn("chr1", 0, 3000, 1.2, 1.0)];
        let retained =
            filter_templated_insertions(links, &set, &segments, DEFAULT_BACKGROUND_PLOIDY);
        assert_eq!(retained.len(), 1);
    }
}
