// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Reconstruction of derivative chromosomes from structural variant
//! breakend (BND) records.
//!
//! A BND record asserts that two genomic positions, each with a facing
//! direction, are adjacent in a rearranged sample genome. This crate
//! recovers ordered, oriented sequences of reference intervals from
//! such adjacencies: linear chains, closed loops, and orphaned
//! reference intervals.
//!
//! Two reconstruction paths are offered. [`reconstruct`] builds a
//! port-based segment graph and walks it deterministically; it needs no
//! heuristics as long as each breakend takes part in a single junction.
//! [`derive`] is the greedy chaining engine for ambiguous input: it
//! seeds chains from mate pairs and extends them with prioritized
//! templated-insertion edges, optionally pruned by copy-number evidence.
//! [`classify`] labels any resulting chain with a rearrangement class.
//!
//! Both paths are pure, synchronous transformations: malformed or
//! partial input shrinks the output, it never errors.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod breakends;
pub mod chains;
pub mod classify;
pub mod cluster;
pub mod cn;
pub mod errors;
pub mod graph;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub use crate::breakends::vcf::{parse_vcf, parse_vcf_str};
pub use crate::breakends::{Breakend, BreakendBuilder, BreakendSet, Direction};
pub use crate::chains::{Chain, ChainEnd, Orientation, WalkSegment};
pub use crate::classify::{classify, SvClass};
pub use crate::cn::{CnSegment, CnSegmentBuilder};
pub use crate::graph::chain::{Derivation, LinkPriority};
pub use crate::graph::walk::{Reconstruction, RefSegment};
pub use crate::graph::{Link, LinkKind, LinkSet};

/// Options for the chaining path.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(default)]
pub struct DeriveOptions {
    /// Copy-number segments for pruning templated-insertion edges; no
    /// pruning when absent.
    #[builder(setter(strip_option))]
    pub cn_segments: Option<Vec<CnSegment>>,
    pub background_ploidy: f64,
    /// Window for the proximity stage of clustering.
    pub proximity_threshold: u64,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        DeriveOptions {
            cn_segments: None,
            background_ploidy: cn::DEFAULT_BACKGROUND_PLOIDY,
            proximity_threshold: cluster::DEFAULT_PROXIMITY_WINDOW,
        }
    }
}

/// Reconstruct derivative chromosomes deterministically via the segment
/// graph walker.
pub fn reconstruct(breakends: Vec<Breakend>) -> Reconstruction {
    let set = BreakendSet::new(breakends);
    graph::walk::reconstruct(&set)
}

/// Assemble derivative chains with the greedy chaining engine.
pub fn derive(breakends: Vec<Breakend>, options: &DeriveOptions) -> Derivation {
    let set = BreakendSet::new(breakends);
    let links = graph::build_links(&set);

    let templated_insertions = match options.cn_segments {
        Some(ref cn_segments) => cn::filter_templated_insertions(
            links.templated_insertions,
            &set,
            cn_segments,
            options.background_ploidy,
        ),
        None => links.templated_insertions,
    };

    let scored = graph::chain::score_links(&set, &templated_insertions);
    let chains = graph::chain::assemble_chains(&set, &links.sv, &scored);

    let clusters = cluster::cluster(&set, options.proximity_threshold)
        .into_iter()
        .map(|members| {
            members
                .into_iter()
                .map(|i| set.get(i).id.clone())
                .collect()
        })
        .collect();

    Derivation { chains, clusters }
}
