//! SunSpec-over-Modbus/TCP server: device image assembly and request
//! servicing behind a shared, address-validated slave context.

pub mod assembly;
pub mod server;
pub mod service;
pub mod slave_context;

pub use assembly::{ModelSummary, ServerConfig};
pub use server::{ModelKey, Server};
pub use service::SunSpecService;
pub use slave_context::SlaveContext;
