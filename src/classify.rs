// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Labeling of reconstructed chains with a rearrangement class.

use serde::Serialize;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::breakends::Direction;
use crate::chains::{Chain, ChainEnd, Orientation};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
pub enum SvClass {
    #[strum(serialize = "DEL")]
    Deletion,
    #[strum(serialize = "DUP")]
    Duplication,
    #[strum(serialize = "INV")]
    Inversion,
    #[strum(serialize = "TRA")]
    Translocation,
    #[strum(serialize = "COMPLEX")]
    Complex,
    #[strum(serialize = "UNKNOWN")]
    Unknown,
}

/// Classify a single chain. Closed chains are complex products; short
/// chains with two open ends are labeled by the junction geometry of
/// their ends; longer chains by their gross segment layout. Multi-chain
/// results are classified chain by chain. Pure and idempotent.
pub fn classify(chain: &Chain) -> SvClass {
    if chain.is_closed {
        return SvClass::Complex;
    }

    if chain.len() <= 1 {
        if let [first, second] = chain.ends.as_slice() {
            return classify_ends(first, second);
        }
        return SvClass::Unknown;
    }

    if chain.contigs().len() > 1 {
        return if chain.len() <= 2 {
            SvClass::Translocation
        } else {
            SvClass::Complex
        };
    }

    if chain
        .segments
        .iter()
        .any(|segment| segment.orientation == Orientation::Reverse)
    {
        return SvClass::Inversion;
    }

    if chain.len() == 2 {
        let (lower, upper) = if chain.segments[0].start <= chain.segments[1].start {
            (&chain.segments[0], &chain.segments[1])
        } else {
            (&chain.segments[1], &chain.segments[0])
        };
        if lower.end < upper.start {
            // A skipped reference interval between two forward segments.
            return SvClass::Deletion;
        }
        if lower.end > upper.start {
            return SvClass::Duplication;
        }
        return SvClass::Unknown;
    }

    SvClass::Complex
}

fn classify_ends(first: &ChainEnd, second: &ChainEnd) -> SvClass {
    if first.contig != second.contig {
        return SvClass::Translocation;
    }
    let (lower, upper) = if first.pos <= second.pos {
        (first, second)
    } else {
        (second, first)
    };
    match (lower.direction, upper.direction) {
        (Direction::Right, Direction::Left) => SvClass::Deletion,
        (Direction::Left, Direction::Right) => SvClass::Duplication,
        _ => SvClass::Inversion,
    }
}
