pub mod connection;
pub mod error;
pub mod memory;
pub mod message;
pub mod transport;
pub mod transport_builder;

pub use connection::MatchboxConnection;
pub use memory::{DropFilter, MemoryConnection, MemoryHub, TransportRegistry};
pub use message::{Envelope, MessageBody};
pub use transport::NetworkConnection;
pub use transport_builder::MatchboxConnectionBuilder;
