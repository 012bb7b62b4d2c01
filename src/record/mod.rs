//! Pure derivations over habit lists: day materialization, summary rollup
//! and merging template edits into today's record.

pub mod materialize;
pub mod merge;
pub mod summary;

pub use materialize::materialize;
pub use merge::resolve;
pub use summary::aggregate;
