// 12.0: notification processor. applies one notification at a time, in chain order, against
// the entity store. every handler does its loads and chain reads first and only then mutates
// and saves, so a skipped notification leaves nothing half-written.

mod core;
mod loans;
mod pairs;
mod pools;
mod results;
mod transfers;

pub use core::Indexer;
pub use results::{IndexerError, ProcessOutcome};
