//! Stage executors
//!
//! One executor per stage kind. Each consumes the current document sequence
//! and returns the next one; only lookup can fail.

mod group;
mod lookup;
mod paginate;
mod project;
mod select;
mod sort;
mod unwind;

pub use group::group;
pub use lookup::{lookup, LookupContext};
pub use paginate::{limit, skip};
pub use project::{project, project_document};
pub use select::select;
pub use sort::sort;
pub use unwind::unwind;
