pub mod error;
pub mod format;
pub mod host;

pub use error::*;
pub use format::*;
pub use host::*;
