//! Error taxonomy shared by the catalog, device image, client, and server.

/// Flat enumeration of failure kinds produced anywhere in the SunSpec
/// core, client, or server. Kept as a single type so client and server
/// code can match on the same set without converting between crate-local
/// enums.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SunSpecError {
    #[error("no SunSpec sentinel found at any candidate address: {candidates:?}")]
    BaseAddressNotFound { candidates: Vec<u16> },

    #[error("invalid base address {address}: expected sentinel, got {value:?}")]
    InvalidBaseAddress { address: u16, value: Vec<u8> },

    #[error(
        "Modbus exception: original_code=0x{original_code:02x} function_code=0x{function_code:02x} exception_code=0x{exception_code:02x}"
    )]
    ModbusException {
        original_code: u8,
        function_code: u8,
        exception_code: u8,
    },

    #[error("unknown point or scale factor reference: model {model_id} point {point_name:?}")]
    Catalog { model_id: u16, point_name: String },

    #[error("operation requires a fresh instance")]
    Reuse,

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("address validation failed: addr={addr} count={count} end_addr={end_addr}")]
    OutOfRange { addr: u16, count: u16, end_addr: u16 },

    #[error("transport I/O error: {0}")]
    Io(String),
}
