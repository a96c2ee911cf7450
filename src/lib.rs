// TCTRUNC LIBRARY
// PURE-RUST ALLOCATION CORE: AGGREGATION, BIN BUDGET, THRESHOLD SEARCH,
// PENALTY OBJECTIVE, TRUNCATION LEVELS.
// SHARED BY THE BINARY (src/main.rs) AND tests/.

pub mod budget;
pub mod error;
pub mod histogram;
pub mod input;
pub mod objective;
pub mod options;
pub mod policy;
pub mod retention;
pub mod study;
pub mod threshold;
pub mod truncation;

pub use error::{Result, TruncError};
