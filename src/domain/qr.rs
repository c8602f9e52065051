pub mod codec;
pub mod errors;
pub mod value_objects;

pub use codec::*;
pub use errors::*;
pub use value_objects::*;
