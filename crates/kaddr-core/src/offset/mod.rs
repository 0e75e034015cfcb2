mod cache;
mod collection;
mod dump;
mod finder;
mod report;

pub use cache::*;
pub use collection::*;
pub use dump::*;
pub use finder::*;
pub use report::*;
