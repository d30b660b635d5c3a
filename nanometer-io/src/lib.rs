//! Nanometer IO - point streaming for laser projection devices
//!
//! This library holds the renderer side of the system: the point data
//! model, the pull protocol, the TCP transport session, the streaming
//! scheduler, and the output devices it drives.
//!
//! ## Data Flow
//!
//! ```text
//! Scheduler ──request──► Session ──TCP──► PointClient ──► PointProvider
//!     ▲                                        │
//!     └────────────── response ◄───────────────┘
//!     │
//!     ├──► PointSink(s)     (pushed frames)
//!     └──► ClockMaster      (pulls through a callback)
//! ```

pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types
pub use crate::config::{Config, StreamingConfig};
pub use crate::core::sink::{ClockMaster, PointSink, PullCallback};
pub use crate::core::source::{
    FallbackProvider, FnProvider, FnSource, GeneratorProvider, PendingPoints, PointProvider,
    PointSource,
};
pub use crate::core::types::{Color, DevicePoint, Point};
pub use crate::error::{Error, Result};
pub use crate::protocol::{Message, Serializer, WireFormat};
pub use crate::scheduler::{ClockMode, Scheduler};
pub use crate::transport::{PointClient, PointServer, Session, center_origin};
