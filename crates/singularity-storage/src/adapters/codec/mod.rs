//! Codec Adapters
//!
//! Implementations of the `ItemCodec` trait.

mod bincode;
mod json;

pub use self::bincode::BincodeItemCodec;
pub use self::json::JsonItemCodec;
