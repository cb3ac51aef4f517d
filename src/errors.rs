// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid BND record: ALT {spec} does not follow BND spec")]
    InvalidBndRecordAlt { spec: String },
    #[error("invalid VCF record at line {line}: {msg}")]
    InvalidRecord { line: usize, msg: String },
    #[error("invalid position {value}: positions are 1-based integers")]
    InvalidPosition { value: String },
}
