//! The `tokio-modbus` [`Service`] adapter (`spec.md` §4.3 component E):
//! dispatches the two function codes this workspace supports to a
//! shared [`SlaveContext`], mapping address-validation failures onto
//! Modbus exception codes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_modbus::server::Service;
use tokio_modbus::{Exception, Request, Response};

use crate::slave_context::SlaveContext;

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

/// Services one accepted connection, sharing its [`SlaveContext`] with
/// every other connection on the same server (`spec.md` §5 — one task
/// per connection, one image behind one mutex).
#[derive(Clone)]
pub struct SunSpecService {
    context: Arc<SlaveContext>,
}

impl SunSpecService {
    pub fn new(context: Arc<SlaveContext>) -> Self {
        SunSpecService { context }
    }
}

impl Service for SunSpecService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = Exception;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Exception>> + Send>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let context = self.context.clone();
        Box::pin(async move {
            match req {
                Request::ReadHoldingRegisters(addr, count) => {
                    if count == 0 {
                        return Err(Exception::IllegalDataValue);
                    }
                    if !context.validate(0x03, addr, count).await {
                        return Err(Exception::IllegalDataAddress);
                    }
                    let bytes = context.get_values(addr, count).await.map_err(|_| Exception::IllegalDataAddress)?;
                    Ok(Response::ReadHoldingRegisters(bytes_to_registers(&bytes)))
                }
                Request::WriteMultipleRegisters(addr, values) => {
                    if values.is_empty() {
                        return Err(Exception::IllegalDataValue);
                    }
                    let count = values.len() as u16;
                    if !context.validate(0x10, addr, count).await {
                        return Err(Exception::IllegalDataAddress);
                    }
                    let bytes = registers_to_bytes(&values);
                    context.set_values(addr, &bytes).await.map_err(|_| Exception::IllegalDataAddress)?;
                    Ok(Response::WriteMultipleRegisters(addr, count))
                }
                other => {
                    log::warn!("unsupported function code in request: {other:?}");
                    Err(Exception::IllegalFunction)
                }
            }
        })
    }
}
