//! Internal building blocks (entry records, graphsplit correlation, manifest pages) that power the
//! public APIs.

pub mod entry;
pub mod graphsplit;
pub mod manifest;
