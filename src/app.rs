//! Application module: exposes the view model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds selection, filter, queue
//! and prompt state; the tracks themselves stay in the `Library`.

mod model;

pub use model::*;
