#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code spells the crate as `::xmlbind`, in doc tests and downstream
// crates alike. The alias makes that path valid inside this crate too.
extern crate self as xmlbind;

// -----------------------------------------------------------------------------
// Modules

pub mod convert;
pub mod decode;
pub mod encode;
pub mod info;
pub mod merge;
pub mod registry;
pub mod tree;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports {
    pub use inventory;
}

pub use decode::{DecodeError, from_path, from_reader, from_str};
pub use encode::{to_string, to_writer};
pub use merge::{Merge, MergeError, merge};
pub use xmlbind_derive as derive;
