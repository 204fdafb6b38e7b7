//! Local median normalization of position sorted ratio data
//!
//! Ratios for a contig are divided by the median of all ratios within a fixed
//! genomic distance of each point.  The running median is maintained by
//! [`MedianTracker`] as a two cursor sweep moves along the contig, so a
//! contig with n points is processed in O(n log n).
//!
//! Contigs are independent, and each sweep owns its own tracker, so separate
//! contigs can be processed on separate threads without any locking.

#[macro_use]
extern crate log;

pub mod binning;
pub mod error;
pub mod normalize;
pub mod tracker;
pub mod window;

pub use binning::bin_points;
pub use error::{Error, Result};
pub use normalize::{
    check_sorted, normalize, NormalizedRatioPoint, RatioPoint, Sweep, WindowedRatioNormalizer,
};
pub use tracker::MedianTracker;
pub use window::{window_end, window_start, Window};
