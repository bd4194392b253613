//! Declarative criteria evaluation for stock screening.
//!
//! Criteria compare two technical-analysis functions of an instrument's price
//! history. Hexagonal architecture: the engine lives in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`], and the
//! command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
