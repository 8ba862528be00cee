use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use crate::ids::IdType;

/// Fatal problems found while decoding a level file.
///
/// Decoding is all-or-nothing: the first error aborts the whole parse and
/// no partially decoded level is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("invalid level signature: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },
    #[error("unsupported level version {found:#x} (newest supported is {max:#x})")]
    UnsupportedVersion { found: u32, max: u32 },
    #[error("unexpected end of data at offset {offset} while reading {what}")]
    UnexpectedEof { offset: usize, what: &'static str },
    #[error("unknown section tag {tag:#010x} at offset {offset}")]
    UnknownSection { tag: u32, offset: usize },
    #[error("invalid {what} value {value} at offset {offset}")]
    InvalidEnum {
        what: &'static str,
        value: u32,
        offset: usize,
    },
    #[error("expected an 8-byte zero terminator at offset {offset} ending the {len}-byte file")]
    BadTerminator { offset: usize, len: usize },
    #[error("{what} count {count} at offset {offset} exceeds the remaining {remaining} bytes")]
    ImplausibleCount {
        what: &'static str,
        count: u32,
        offset: usize,
        remaining: usize,
    },
    #[error("unterminated {what} string at offset {offset}")]
    UnterminatedString { what: &'static str, offset: usize },
}

/// Non-fatal problems found while binding or simulating a level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum Warning {
    #[error("node {from} links to id {id}, which does not resolve to a live {expected:?} object")]
    Unresolved { from: i32, id: i32, expected: IdType },
    #[error("id {id} is already bound as {existing:?}; ignoring the {rejected:?} binding")]
    DuplicateId {
        id: i32,
        existing: IdType,
        rejected: IdType,
    },
    #[error("event {id} has unknown type '{class_name}' and will stay inert")]
    UnknownEventType { id: i32, class_name: String },
    #[error("event {id} ({class_name}) has no runtime behavior; activation ignored")]
    InertEvent { id: i32, class_name: String },
    #[error("moving group '{group}' has unknown movement type {value}; treating it as one-way")]
    UnknownMovementType { group: String, value: u32 },
    #[error("record {id} is malformed: {reason}")]
    MalformedRecord { id: i32, reason: String },
    #[error("activation budget of {budget} per tick exhausted; deferring the rest")]
    ActivationBudget { budget: usize },
}

/// Collects simulation warnings, logging each distinct warning once.
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen: HashSet<Warning>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning. Returns `false` when the same warning was already
    /// reported earlier.
    pub fn report(&mut self, warning: Warning) -> bool {
        if self.seen.contains(&warning) {
            return false;
        }
        warn!("{warning}");
        self.seen.insert(warning.clone());
        self.warnings.push(warning);
        true
    }

    /// Returns every distinct warning in the order it was first reported.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
