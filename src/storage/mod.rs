//! Durable state of the tracker lives in [counter::CounterStore].
//! The basic idea is:
//!  - The whole durable footprint is two files inside the application directory.
//!  - `code_time.dat` holds the cumulative counter as a single plain-text integer.
//!  - `badge.md` is a derived artifact, rewritten wholesale on every flush and
//!    never read back.

pub mod badge;
pub mod counter;
