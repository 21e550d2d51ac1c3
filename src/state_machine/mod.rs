//! Pure state machines for the capture pipeline.
//!
//! Both machines use the single-writer pattern: every transition goes
//! through a `reduce()` function returning the next state plus the effects
//! the owner must execute. Events carry the session id so late signals from
//! an earlier session are dropped.

pub mod recorder;
pub mod synthesis;
