#![doc(html_root_url = "https://docs.rs/streamframe/latest")]
//! Public API for the `streamframe` library.
//!
//! This crate multiplexes many independent byte streams over one duplex
//! connection. Each logical payload is sliced into chunks by a
//! [`Disassembler`], written by a single-writer [`PayloadSender`], read by a
//! single-reader [`PayloadReceiver`] and stitched back together by an
//! [`AssemblyRegistry`].

pub mod assembly;
pub mod byte_order;
pub mod codec;
pub mod config;
pub mod disassembler;
pub mod error;
pub mod header;
mod link;
pub mod metrics;
pub mod operations;
pub mod panic;
pub mod payloads;
pub mod receiver;
pub mod sender;
pub mod transport;

pub use assembly::{
    AbandonedPayload,
    AssembledPayload,
    AssemblyConsumer,
    AssemblyEvent,
    AssemblyRegistry,
    ChannelConsumer,
    CompletedAssembly,
    ControlChunk,
};
pub use codec::{Chunk, ChunkCodec, CodecError};
pub use config::{ConfigError, TransportConfig};
pub use disassembler::{Disassembler, DisassemblyError, PayloadSource, SourceLength};
pub use error::{ConnectError, DisconnectReason, SendError};
pub use header::{HEADER_LEN, Header, HeaderError, PayloadType, StreamId};
pub use metrics::{ABANDONED_STREAMS_TOTAL, CHUNKS_TOTAL, DISCONNECTS_TOTAL, Direction};
pub use operations::{ContentStream, SendOperations};
pub use payloads::{RequestPayload, ResponsePayload, StreamDescription};
pub use receiver::{ChunkSink, FrameHandler, PayloadReceiver};
pub use sender::{Completion, PayloadSender};
pub use transport::connect_duplex;
