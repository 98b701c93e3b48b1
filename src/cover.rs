//! Background cover-art probe.
//!
//! Opening a track's details asks a worker thread to fetch the cover URL.
//! The UI only shows what came back (content type and size); it never decodes
//! the image. Requests carry a generation number and results for anything
//! but the latest request are discarded, which is how a pending probe is
//! cancelled when the user moves on.

mod fetch;
mod worker;

pub use fetch::{CoverMeta, HttpFetcher};
pub use worker::{CoverProbe, CoverStatus};
