//! Protocol module for decoding scale notification frames.

pub mod frame;

pub use frame::decode;
