//! CLI command implementations.

pub mod generate;
pub mod inspect;
pub mod normalize;
pub mod roundtrip;
