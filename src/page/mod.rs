// Page-level encode/decode contract.
//
// The page manager hands every page read from disk to the active
// `PageCodec` before interpreting row data, and every page about to be
// flushed back to storage through `encode_page`.
//
// # Modules
//
// - `codec`: `PageCodec` trait, buffer model, built-in handlers, providers

pub mod codec;

pub use codec::{
    CodecContext, CodecError, CodecProvider, DefaultCodecProvider, IdentityCodec, PageBuffers,
    PageCodec, UnsupportedCodec, decode_page_in_place,
};
