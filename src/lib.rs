//! Property based testing with byte-oriented shrinking. Every generated
//! value is a deterministic function of a recorded choice sequence, so
//! counterexamples are minimised by editing bytes rather than values.

extern crate hex_slice;
#[macro_use]
extern crate log;
extern crate rand;

pub mod data;
pub mod generators;
pub mod properties;

pub use properties::{check, property, CheckConfig, CheckResult, FailureReport, Property};
