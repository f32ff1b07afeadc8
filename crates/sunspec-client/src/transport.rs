//! Connection contract between the client and a Modbus peer
//! (`spec.md` §4.2 "Connection contract").
//!
//! The framing layer itself — MBAP, function-code dispatch, connection
//! lifecycle — is an external collaborator (`tokio-modbus`); this module
//! only adapts it to the two operations the scan and point-I/O state
//! machines need.

use std::net::SocketAddr;
use std::sync::Arc;

use sunspec_core::error::SunSpecError;
use tokio::sync::Mutex;
use tokio_modbus::client::{tcp, Context, Reader, Writer};
use tokio_modbus::slave::Slave;

/// Fixed unit id used for every request (`spec.md` §4.2).
pub const UNIT_ID: u8 = 0x01;

/// The only two operations a scan or point-I/O step needs from a Modbus
/// peer: a ranged holding-register read and write, each returning the
/// shared [`SunSpecError`] taxonomy rather than a transport-specific
/// error type.
#[async_trait::async_trait]
pub trait ModbusTransport: Send {
    async fn read_holding(&mut self, addr: u16, count: u16) -> Result<Vec<u8>, SunSpecError>;
    async fn write_holding(&mut self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError>;
}

fn registers_to_bytes(registers: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(registers.len() * 2);
    for r in registers {
        bytes.extend_from_slice(&r.to_be_bytes());
    }
    bytes
}

fn bytes_to_registers(bytes: &[u8]) -> Vec<u16> {
    bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect()
}

fn exception_to_error(function_code: u8, exception: tokio_modbus::Exception) -> SunSpecError {
    SunSpecError::ModbusException {
        original_code: function_code,
        function_code: function_code | 0x80,
        exception_code: exception as u8,
    }
}

/// Live Modbus/TCP transport backed by `tokio-modbus`.
pub struct TcpTransport {
    ctx: Context,
}

impl TcpTransport {
    pub async fn connect(host: &str, port: u16) -> Result<Self, SunSpecError> {
        let addr: SocketAddr =
            format!("{host}:{port}").parse().map_err(|e| SunSpecError::Io(format!("invalid address: {e}")))?;
        let ctx = tcp::connect_slave(addr, Slave(UNIT_ID))
            .await
            .map_err(|e| SunSpecError::Io(format!("connect failed: {e}")))?;
        Ok(TcpTransport { ctx })
    }
}

#[async_trait::async_trait]
impl ModbusTransport for TcpTransport {
    async fn read_holding(&mut self, addr: u16, count: u16) -> Result<Vec<u8>, SunSpecError> {
        match self.ctx.read_holding_registers(addr, count).await {
            Ok(Ok(registers)) => Ok(registers_to_bytes(&registers)),
            Ok(Err(exception)) => Err(exception_to_error(0x03, exception)),
            Err(e) => Err(SunSpecError::Io(e.to_string())),
        }
    }

    async fn write_holding(&mut self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError> {
        let registers = bytes_to_registers(bytes);
        match self.ctx.write_multiple_registers(addr, &registers).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(exception)) => Err(exception_to_error(0x10, exception)),
            Err(e) => Err(SunSpecError::Io(e.to_string())),
        }
    }
}

/// In-process transport over a shared [`sunspec_core::DeviceImage`], used
/// by this crate's own tests so scan and point-I/O logic can be
/// exercised without a real socket.
#[derive(Clone)]
pub struct InMemoryTransport {
    image: Arc<Mutex<sunspec_core::DeviceImage>>,
}

impl InMemoryTransport {
    pub fn new(image: Arc<Mutex<sunspec_core::DeviceImage>>) -> Self {
        InMemoryTransport { image }
    }
}

#[async_trait::async_trait]
impl ModbusTransport for InMemoryTransport {
    async fn read_holding(&mut self, addr: u16, count: u16) -> Result<Vec<u8>, SunSpecError> {
        let image = self.image.lock().await;
        image.read_slice(addr, count).map(|s| s.to_vec()).map_err(|e| match e {
            SunSpecError::OutOfRange { .. } => SunSpecError::ModbusException {
                original_code: 0x03,
                function_code: 0x83,
                exception_code: 0x02,
            },
            other => other,
        })
    }

    async fn write_holding(&mut self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError> {
        let mut image = self.image.lock().await;
        image.write_slice(addr, bytes).map_err(|e| match e {
            SunSpecError::OutOfRange { .. } => SunSpecError::ModbusException {
                original_code: 0x10,
                function_code: 0x90,
                exception_code: 0x02,
            },
            other => other,
        })
    }
}
