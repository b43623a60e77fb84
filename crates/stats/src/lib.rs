//! # wavehmm-stats
//!
//! Numerically stable sufficient-statistics storage for block segmentation.
//!
//! ## Lifecycle
//!
//! ```text
//!  ┌────────────────┐  build()  ┌────────────────┐  set_stats(start, end)  ┌──────────────┐
//!  │ RawStatistics  │──────────▶│ IntegralArray  │────────────────────────▶│ suff_stat(d) │
//!  │ (per position) │           │ (cell suffixes)│                         │ (cached)     │
//!  └────────────────┘           └────────────────┘                         └──────────────┘
//! ```
//!
//! Raw per-position statistics are consumed by [`IntegralArray::new`] and
//! rewritten in place into Kahan-stable suffix sums within fixed-size cells.
//! Any range `[start, end)` is then answered with one lookup per touched cell.
//!
//! ## Quick start
//!
//! ```rust
//! use wavehmm_stats::{IntegralArray, RawStatistics};
//!
//! let raw = RawStatistics::from_values(&[1.0, 2.0, 3.0, 4.0], 1).unwrap();
//! let integral = IntegralArray::new(raw).unwrap();
//! let block = integral.block_stats(1, 3, 0).unwrap();
//! assert_eq!(block.sum(), 5.0);
//! assert_eq!(block.sum_sq(), 13.0);
//! ```

mod error;
mod integral;
mod kahan;
mod suffstat;

pub use error::StatsError;
pub use integral::{CELL_SIZE, IntegralArray, RawStatistics};
pub use kahan::{KahanAggregator, KahanValue, kahan_suffix_sums};
pub use suffstat::NormalStats;
