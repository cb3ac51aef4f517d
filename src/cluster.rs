// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Informational grouping of breakends into putative events: shared
//! event tag, then mate linkage, then same-contig proximity.

use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;

use crate::breakends::BreakendSet;

pub const DEFAULT_PROXIMITY_WINDOW: u64 = 5000;

/// Partition breakend indices into clusters. Components are reported
/// sorted by their minimal member, members in set order.
pub fn cluster(set: &BreakendSet, proximity: u64) -> Vec<Vec<usize>> {
    let n = set.len();
    if n == 0 {
        return Vec::new();
    }
    let mut components = UnionFind::<usize>::new(n);

    let mut event_representative: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, breakend) in set.iter().enumerate() {
        if let Some(ref event) = breakend.event {
            match event_representative.get(event.as_str()) {
                Some(&representative) => {
                    components.union(representative, i);
                }
                None => {
                    event_representative.insert(event, i);
                }
            }
        }
    }

    for i in 0..n {
        if let Some(mate) = set.mate_of(i) {
            components.union(i, mate);
        }
    }

    for i in 1..n {
        let previous = set.get(i - 1);
        let current = set.get(i);
        if previous.contig == current.contig && current.pos - previous.pos <= proximity {
            components.union(i - 1, i);
        }
    }

    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        clusters.entry(components.find(i)).or_default().push(i);
    }
    let mut clusters: Vec<Vec<usize>> = clusters.into_values().collect();
    clusters.sort_by_key(|members| members[0]);
    clusters
}
