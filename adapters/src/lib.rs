mod channel_notifier;
mod identity;
mod in_memory;
mod in_memory_bus;
pub mod relay_protocol;
mod system;
pub mod web;
mod websocket;

pub use channel_notifier::ChannelNotifier;
pub use identity::StaticIdentity;
pub use in_memory::InMemory;
pub use in_memory_bus::{InMemoryBus, InMemoryTransport};
pub use system::{SystemClock, TokioTimer};
pub use websocket::WebSocketTransport;
