//! Queue backends.

pub mod channel;
pub mod memory;

pub use channel::ChannelQueue;
pub use memory::InMemoryQueue;
