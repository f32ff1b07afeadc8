//! SunSpec-over-Modbus/TCP client: base-address discovery, the model
//! walk, and scale-factor-aware point I/O.

pub mod client;
pub mod point_io;
pub mod scan;
pub mod transport;

pub use client::{Client, ModelKey, ScanConfig, DEFAULT_BASE_CANDIDATES};
pub use transport::{InMemoryTransport, ModbusTransport, TcpTransport, UNIT_ID};
