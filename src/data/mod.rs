//! This module contains the underlying data representation and shrinking
//! mechanism. The main type is the `ChoiceSequence`, the byte buffer that
//! encodes every random decision one predicate run makes.
//!
//! Also manages the shrinking process (see [`Shrinker`](struct.Shrinker.html)).

mod shrinkers;
mod source;
pub use self::shrinkers::*;
pub use self::source::*;
