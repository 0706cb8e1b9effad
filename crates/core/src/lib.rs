// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vrlog-core: pure data model, parser, file selector and filter
//! compilation for the relay daemon. Nothing in this crate touches the
//! filesystem, a clock, or the network — it is the part of the system
//! that is a pure function of its inputs.

pub mod filter;
pub mod id;
pub mod level;
pub mod parsed;
pub mod parser;
pub mod raw_line;
pub mod record;
pub mod selector;
pub mod source_status;
pub mod source_tag;
pub mod timestamp;

pub use filter::{
    CompiledFilter, FilterClause, FilterDimension, FilterError, FilterOperand, FilterOperator,
};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use level::Level;
pub use parsed::{Parsed, ParsedKind};
pub use parser::parse;
pub use raw_line::RawLine;
pub use record::{Origin, ProcessedRecord};
pub use selector::{
    candidate_session_files, is_session_file_name, select_from_listing, select_session_files,
    SessionFile,
};
pub use source_status::SourceStatus;
pub use source_tag::SourceTag;
