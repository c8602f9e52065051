pub mod errors;
pub mod source;

pub use errors::*;
pub use source::*;
