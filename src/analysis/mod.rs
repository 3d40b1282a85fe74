//! Cleaning and aggregation pipeline.
//!
//! ```text
//!   raw rows ──► normalize ──► ExpeditionBatch ─┬─► aggregate    (years, peaks, seasons)
//!                   ▲                          ├─► nationality  (country counts)
//!                 cache                        ├─► funnel       (ascent pyramid)
//!                                              └─► agency       (elite ranking)
//! ```
//!
//! Every view is a pure function of a record slice.

pub mod agency;
pub mod aggregate;
pub mod cache;
pub mod error;
pub mod funnel;
pub mod nationality;
pub mod normalize;
pub mod utility;

pub use error::{AnalysisError, AnalysisResult};
