//! Price retrieval at the engine boundary.
//!
//! Constituent series are fetched concurrently and awaited together; a
//! failing symbol is recorded and excluded without failing the build.

pub mod fanout;
pub mod source;
