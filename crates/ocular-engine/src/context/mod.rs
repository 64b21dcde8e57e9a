//! Context identity bookkeeping.
//!
//! Every GPU-bound operation runs while a [`ContextToken`] is alive on the
//! calling thread. Tokens register the owning canvas in the process-wide
//! [`ContextTracker`], which only diagnoses mis-paired acquire/release; the
//! GPU driver state remains the source of truth.

mod identity;
mod token;
mod tracker;

pub use identity::SurfaceId;
pub use token::ContextToken;
pub use tracker::ContextTracker;
