//! The Modbus-facing half of the server (`spec.md` §4.3 component E):
//! address-validated register get/set over a shared [`DeviceImage`].
//!
//! Wraps the image behind a `tokio::sync::Mutex`, taking the lock only
//! for the duration of each call and never across I/O — the same
//! shape the donor's `ModbusTcpClient` used for its
//! `Arc<Mutex<Option<client::Context>>>`, applied here to guard shared
//! state instead of a client connection.

use std::sync::Arc;

use sunspec_core::error::SunSpecError;
use sunspec_core::DeviceImage;
use tokio::sync::Mutex;

/// Shared, lock-guarded device image a [`crate::service::SunSpecService`]
/// reads and writes on behalf of every accepted connection.
pub struct SlaveContext {
    image: Mutex<DeviceImage>,
}

impl SlaveContext {
    pub fn new(image: DeviceImage) -> Arc<Self> {
        Arc::new(SlaveContext { image: Mutex::new(image) })
    }

    /// `true` iff `addr..addr+count` lies entirely within the image
    /// (`spec.md` §4.3's `validate`). The requesting function code is
    /// accepted for logging only — every function code shares one
    /// address space.
    pub async fn validate(&self, function_code: u8, addr: u16, count: u16) -> bool {
        let image = self.image.lock().await;
        let ok = image.validate(addr, count);
        if !ok {
            log::warn!(
                "address validation failed: fc=0x{function_code:02x} addr={addr} count={count} end_addr={}",
                image.end_addr()
            );
        }
        ok
    }

    /// Read `count` registers starting at `addr` as raw big-endian bytes.
    pub async fn get_values(&self, addr: u16, count: u16) -> Result<Vec<u8>, SunSpecError> {
        let image = self.image.lock().await;
        image.read_slice(addr, count).map(|s| s.to_vec())
    }

    /// Write `bytes` (an even-length run of big-endian register pairs)
    /// starting at `addr`. `count = bytes.len() / 2`, per the Open
    /// Question pinned in `spec.md` §9.
    pub async fn set_values(&self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError> {
        let mut image = self.image.lock().await;
        image.write_slice(addr, bytes)
    }

    pub async fn base_addr(&self) -> u16 {
        self.image.lock().await.base_addr()
    }
}

#[cfg(test)]
mod tests {
    use sunspec_core::{Catalog, DeviceImageBuilder};

    use super::*;

    fn image() -> DeviceImage {
        let catalog = Catalog::builtin();
        let mut b = DeviceImageBuilder::new(40_000);
        b.push_model(1, 66, catalog.model(1).cloned(), &vec![0u8; 132]);
        b.finish()
    }

    #[tokio::test]
    async fn get_set_round_trips() {
        let ctx = SlaveContext::new(image());
        ctx.set_values(40_002, &[0, 1, 0, 66]).await.unwrap();
        let values = ctx.get_values(40_002, 2).await.unwrap();
        assert_eq!(values, vec![0, 1, 0, 66]);
    }

    #[tokio::test]
    async fn validate_rejects_out_of_range_matching_scenario_5() {
        let ctx = SlaveContext::new(image());
        assert!(ctx.get_values(0, 1).await.is_err());
        assert!(!ctx.validate(0x03, 9_999, 1).await);
    }

    #[tokio::test]
    async fn validate_accepts_in_range_read() {
        let ctx = SlaveContext::new(image());
        assert!(ctx.validate(0x03, 40_000, 2).await);
    }

    #[tokio::test]
    async fn set_values_uses_register_count_matching_scenario_3() {
        let ctx = SlaveContext::new(image());
        // 4 bytes == 2 registers; a byte-length interpretation would
        // reject this as out of range starting one register later.
        ctx.set_values(40_070, &[0, 0, 0, 0]).await.unwrap();
        assert!(ctx.validate(0x10, 40_072, 1).await);
    }
}
