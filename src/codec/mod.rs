//! Opus-in-Ogg stream reading
//!
//! Validates the two mandatory header packets of a single Opus logical
//! stream and hands out the remaining packets as raw encoded frames.

pub mod header;
pub mod reader;

pub use header::{ChannelMapping, CommentHeader, IdentificationHeader};
pub use reader::OpusStreamReader;
