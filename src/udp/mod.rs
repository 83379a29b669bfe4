//! Chunked UDP transport: datagram header parsing and stateful reassembly.

pub mod chunk;
pub mod reassembler;

pub use chunk::{ChunkHeader, parse_chunk, write_chunk};
pub use reassembler::Reassembler;
