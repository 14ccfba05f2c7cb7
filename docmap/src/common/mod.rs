//! Common value types, conversion traits and small utilities shared by every
//! other module.

mod constants;
mod convertible;
mod document;
mod foreign;
mod naming;
mod type_utils;
mod value;

pub use constants::*;
pub use convertible::*;
pub use document::*;
pub use foreign::*;
pub use naming::*;
pub use type_utils::*;
pub use value::*;
