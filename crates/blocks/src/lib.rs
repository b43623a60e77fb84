//! # wavehmm-blocks
//!
//! Block structures that partition a series into runs of positions sharing
//! one hidden state draw.
//!
//! ## Structures
//!
//! | Type | Partition |
//! |------|-----------|
//! | [`BreakpointArray`] | new block wherever a breakpoint weight reaches the threshold |
//! | [`FixedBlocks`] | predetermined sizes, threshold ignored |
//!
//! Both implement [`BlockStructure`], a pull-based iterator:
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> NotStarted: init_forward / set_threshold
//!     NotStarted --> Iterating: next_block() == true
//!     Iterating --> Iterating: next_block() == true
//!     Iterating --> Finished: next_block() == false
//!     Finished --> NotStarted: init_forward
//! ```
//!
//! [`BlockStructure::nr_blocks`] is only available in the `Finished` state
//! for threshold-dependent structures.
//!
//! ## Quick Start
//!
//! ```rust
//! use wavehmm_blocks::{BlockStructure, BreakpointArray};
//!
//! let mut blocks: BreakpointArray = BreakpointArray::new(vec![f64::INFINITY, 0.0, 4.0, 0.0]).unwrap();
//! blocks.set_threshold(1.0).unwrap();
//! blocks.init_forward();
//! while blocks.next_block() {
//!     println!("[{}, {})", blocks.start(), blocks.end());
//! }
//! assert_eq!(blocks.nr_blocks().unwrap(), 2);
//! ```

mod breakpoint_array;
mod error;
mod fixed;
mod pointer;
mod structure;

pub use breakpoint_array::BreakpointArray;
pub use error::BlocksError;
pub use fixed::FixedBlocks;
pub use pointer::JumpPointer;
pub use structure::{BlockStructure, IterState, collect_blocks, universal_threshold};
