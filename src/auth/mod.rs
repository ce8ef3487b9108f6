//! Passive credential capture.
//!
//! The tool never logs in. It watches authenticated catalog calls made by
//! the user's browser session (replayed from a HAR capture, or supplied as
//! raw header values) and keeps the most recent bearer token and device id.

pub mod capture;
pub mod error;
pub mod har;

pub use capture::{CaptureMonitor, Credential};
