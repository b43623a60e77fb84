//! # wavehmm-wavelet
//!
//! Haar wavelet transforms that turn a signal into breakpoint weights for
//! block compression.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["values (stream)"] -->|"MaxletTransform::push"| B["MaxletTransform"]
//!     B -->|"finish()?"| C["MaxletOutput"]
//!     C -->|"coeffs"| D["noise_std_estimate"]
//!     C -->|"coeffs"| E["haar_breakpoint_weights"]
//!     E --> F["scale_weights"]
//!     C -->|"stats"| G["RawStatistics"]
//! ```
//!
//! The maxlet coefficient at position `t` is the largest absolute Haar
//! detail coefficient, across scales and data dimensions, of any wavelet
//! whose discontinuity is at `t`. Position 0 is always infinite so that the
//! first position starts a block.
//!
//! ## Quick Start
//!
//! ```rust
//! use wavehmm_wavelet::{haar_breakpoint_weights, maxlet_from_reader};
//!
//! let input = "0 0 0 0 4 4 4 4\n";
//! let (mut weights, stats) = maxlet_from_reader(input.as_bytes(), 1, 8)
//!     .unwrap()
//!     .into_parts();
//! haar_breakpoint_weights(&mut weights).unwrap();
//! assert!(weights[0].is_infinite());
//! assert!(weights[4] > 0.0);
//! assert_eq!(stats.len(), 8);
//! ```

mod breakpoint;
mod error;
mod haar;
mod maxlet;

pub use breakpoint::{haar_breakpoint_weights, noise_std_estimate, scale_weights};
pub use error::WaveletError;
pub use haar::{
    haar_detail_coeffs, haar_transform, inverse_haar_transform, maxlet_coeffs, merge_dimensions,
};
pub use maxlet::{MaxletOutput, MaxletTransform, maxlet_from_reader};
