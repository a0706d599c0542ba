//! Synthetic Index Construction.
//!
//! Covers:
//! 1. **Definition resolution** -- code/symbol normalization, duplicate merging, fallbacks
//! 2. **Weight normalization** -- absolute weights, then percentages, else equal
//! 3. **Alignment** -- effective start date and union trading timeline
//! 4. **Compositing** -- buy-and-hold rebased index with forward-fill
//! 5. **Building** -- the above end to end, with constituent reports

pub mod alignment;
pub mod builder;
pub mod compositor;
pub mod definition;
pub mod weights;
