//! Provider transport layer
//!
//! One streaming transport, one wire format. The [`Transport`] trait is the
//! seam the turn engine consumes; [`GeminiTransport`] is the production
//! implementation.

mod error;
mod transport;
mod types;

pub use error::TransportError;
pub use transport::{ChunkStream, GeminiTransport, Transport};
pub use types::{FinishReason, Message, ModelChunk, Part, RawChunk, Role, TokenUsage};
