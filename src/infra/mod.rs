//! Infrastructure adapters: queue backends and a scripted device.

pub mod mock_device;
pub mod queue;

pub use mock_device::{DeviceCall, MockDevice, MockOp};
pub use queue::{ChannelQueue, InMemoryQueue};
