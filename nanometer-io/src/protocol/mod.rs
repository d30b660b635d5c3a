//! Pull protocol: message types and their framed wire encoding

pub mod messages;
pub mod wire;

pub use messages::Message;
pub use wire::{FrameReader, MAX_FRAME_LEN, Serializer, WireFormat, create_serializer};
