//! Word count extraction pipeline.
//!
//! ```text
//! PDF File
//!     ↓
//! [TextStrategy #1] → normalize → count ── count ≥ threshold ──→ done
//!     ↓ below threshold (or failed)
//! [TextStrategy #2] → normalize → count → keep max
//!     ↓ ...
//! [OcrStrategy] (only when enabled)
//!     ↓
//! best word count
//! ```

pub mod cascade;

pub use cascade::{AttemptOutcome, Cascade, CascadeOutcome, StrategyAttempt};
