//! Message types for the pull protocol.
//!
//! One channel carries both directions:
//! - Point requests (daemon → source): "send me N points"
//! - Point responses (source → daemon): the batch itself
//!
//! The enum is externally tagged, so every encoding writes the variant tag
//! before the payload and a single decoder can tell the two apart.

use crate::core::types::Point;
use serde::{Deserialize, Serialize};

/// Top-level protocol message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message {
    /// Ask the connected source for exactly `num` points
    PointRequest { num: u32 },
    /// Answer to the most recent request
    PointResponse { points: Vec<Point> },
}

impl Message {
    pub fn request(num: usize) -> Self {
        Message::PointRequest {
            num: u32::try_from(num).unwrap_or(u32::MAX),
        }
    }

    pub fn response(points: Vec<Point>) -> Self {
        Message::PointResponse { points }
    }

    /// Variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Message::PointRequest { .. } => "PointRequest",
            Message::PointResponse { .. } => "PointResponse",
        }
    }
}
