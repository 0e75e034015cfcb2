//! Seams to the live kernel.
//!
//! Determining the slide and disclosing kernel memory are done elsewhere in
//! the toolkit; the resolver only needs these two entry points.

mod dumper;
mod slide;

pub use dumper::*;
pub use slide::*;
