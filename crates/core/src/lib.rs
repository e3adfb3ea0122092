pub mod context;
pub mod entry;
pub mod export;
pub mod omit;
pub mod text;
pub mod timestamp;
pub mod validate;

pub use context::{InheritOptions, MessageContext};
pub use entry::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
