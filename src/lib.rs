//! dcacompare: Lump Sum vs dollar-cost-averaging comparison for one or two assets.
//!
//! Hexagonal architecture: pure analytics in [`domain`], port traits in [`ports`],
//! concrete I/O in [`adapters`], and the command-line front end in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
