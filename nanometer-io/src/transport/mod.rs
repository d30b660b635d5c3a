//! Transport session over TCP
//!
//! - [`server`]: daemon side, single active source, one outstanding request
//! - [`client`]: source side, answers requests from a [`PointProvider`](crate::core::source::PointProvider)

pub mod client;
pub mod server;

pub use client::{PointClient, center_origin};
pub use server::{PointServer, Session};
