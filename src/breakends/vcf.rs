// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of breakends from VCF text. Only `SVTYPE=BND` records are of
//! interest; everything else is a skippable fact, not an error.

use std::io::BufRead;

use anyhow::Result;
use regex::Regex;

use crate::breakends::{Breakend, Direction};
use crate::errors::Error;

lazy_static! {
    static ref ALT_RE: Regex = Regex::new(
        "^(?P<lead>[ACGTNacgtn]+)?(?P<bracket1>[\\]\\[])(?P<contig>[^\\]\\[:]+):(?P<pos>[0-9]+)(?P<bracket2>[\\]\\[])(?P<trail>[ACGTNacgtn]+)?$"
    )
    .unwrap();
}

/// Interpretation of a BND ALT field (VCF 4.3):
///
/// * `t[p:q[` → direction `Right`, mate direction `Right`
/// * `t]p:q]` → direction `Right`, mate direction `Left`
/// * `]p:q]t` → direction `Left`, mate direction `Left`
/// * `[p:q[t` → direction `Left`, mate direction `Right`
///
/// i.e. a leading reference sequence faces `Right`, a trailing one faces
/// `Left`; the bracket type encodes the mate's facing.
pub(crate) fn parse_alt(spec: &str) -> Result<(Direction, String, u64, Direction)> {
    let invalid = || Error::InvalidBndRecordAlt {
        spec: spec.to_owned(),
    };

    let caps = ALT_RE.captures(spec).ok_or_else(invalid)?;

    let bracket = caps.name("bracket1").unwrap().as_str();
    if bracket != caps.name("bracket2").unwrap().as_str() {
        return Err(invalid().into());
    }

    let direction = match (caps.name("lead"), caps.name("trail")) {
        (Some(_), None) => Direction::Right,
        (None, Some(_)) => Direction::Left,
        _ => return Err(invalid().into()),
    };
    let mate_direction = if bracket == "[" {
        Direction::Right
    } else {
        Direction::Left
    };

    let mate_contig = caps.name("contig").unwrap().as_str().to_owned();
    let mate_pos: u64 = caps.name("pos").unwrap().as_str().parse()?;

    Ok((direction, mate_contig, mate_pos, mate_direction))
}

/// Parse breakends from VCF text. Header lines (`#`) are ignored;
/// records that are not breakends are skipped, structurally broken
/// lines are dropped with their error logged.
pub fn parse_vcf<R: BufRead>(reader: R) -> Result<Vec<Breakend>> {
    let mut breakends = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_record(&line, number + 1) {
            Ok(Some(breakend)) => breakends.push(breakend),
            Ok(None) => debug!("skipping non-BND VCF record in line {}", number + 1),
            Err(e) => debug!("skipping VCF record in line {}: {}", number + 1, e),
        }
    }
    Ok(breakends)
}

pub fn parse_vcf_str(vcf: &str) -> Result<Vec<Breakend>> {
    parse_vcf(vcf.as_bytes())
}

/// Parse one record line into a breakend; `Ok(None)` for records that
/// are simply not breakends. Structural problems (missing columns,
/// unparseable or zero positions, malformed BND ALTs) are reported as
/// errors for the caller to drop. Both the standard eight-column layout
/// (ALT in the fifth column) and the abbreviated four-column layout
/// `CHROM POS ID ALT` are accepted; the INFO column is the first
/// `key=value` column after ALT.
fn parse_record(line: &str, number: usize) -> Result<Option<Breakend>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 4 {
        return Err(Error::InvalidRecord {
            line: number,
            msg: "expected at least four tab-separated columns".to_owned(),
        }
        .into());
    }

    let contig = fields[0];
    let id = fields[2];
    let pos: u64 = fields[1].parse().map_err(|_| Error::InvalidPosition {
        value: fields[1].to_owned(),
    })?;
    if pos == 0 {
        return Err(Error::InvalidPosition {
            value: fields[1].to_owned(),
        }
        .into());
    }

    let alt_col = if fields.len() >= 5 && ALT_RE.is_match(fields[4]) {
        4
    } else if ALT_RE.is_match(fields[3]) {
        3
    } else if fields.len() >= 5 {
        4
    } else {
        3
    };
    let alt = fields[alt_col];

    let info = fields[alt_col + 1..].iter().find(|field| field.contains('='));
    let mut svtype = None;
    let mut mate_id = None;
    let mut event = None;
    let mut jcn = None;
    let mut jcn_uncertainty = None;
    if let Some(info) = info {
        for entry in info.split(';') {
            match entry.split_once('=') {
                Some(("SVTYPE", value)) => svtype = Some(value),
                Some(("MATEID", value)) => mate_id = Some(value.to_owned()),
                Some(("EVENT", value)) => event = Some(value.to_owned()),
                Some(("JCN", value)) => jcn = first_float(value),
                Some(("JCNUNCERT", value)) => jcn_uncertainty = first_float(value),
                _ => (),
            }
        }
    }
    match svtype {
        Some("BND") => (),
        Some(_) => return Ok(None),
        // Without an SVTYPE, only a BND-shaped ALT marks a breakend.
        None if !ALT_RE.is_match(alt) => return Ok(None),
        None => (),
    }

    let (direction, mate_contig, mate_pos, mate_direction) = parse_alt(alt)?;

    Ok(Some(Breakend {
        id: id.to_owned(),
        contig: contig.to_owned(),
        pos,
        direction,
        mate_id,
        mate_contig,
        mate_pos,
        mate_direction,
        event,
        jcn,
        jcn_uncertainty,
    }))
}

fn first_float(value: &str) -> Option<f64> {
    value.split(',').next().and_then(|v| v.parse().ok())
}
