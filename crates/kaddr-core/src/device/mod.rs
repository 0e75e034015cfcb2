mod build;
mod identifier;
mod model;
mod platform;

pub use build::*;
pub use identifier::*;
pub use model::*;
pub use platform::*;
