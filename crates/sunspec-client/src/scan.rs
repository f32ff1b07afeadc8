//! The scan state machine (`spec.md` §4.2): base-address discovery
//! followed by the model walk.

use sunspec_core::error::SunSpecError;
use sunspec_core::{Catalog, DeviceImage, DeviceImageBuilder, SENTINEL};

use crate::transport::ModbusTransport;

/// Resolve the device's base address: confirm a pre-set address, or try
/// each candidate in order until one's sentinel matches.
pub async fn resolve_base_addr(
    transport: &mut dyn ModbusTransport,
    preset: Option<u16>,
    candidates: &[u16],
) -> Result<u16, SunSpecError> {
    if let Some(address) = preset {
        let bytes = transport.read_holding(address, 2).await?;
        if bytes == SENTINEL {
            return Ok(address);
        }
        return Err(SunSpecError::InvalidBaseAddress { address, value: bytes });
    }

    for &candidate in candidates {
        if let Ok(bytes) = transport.read_holding(candidate, 2).await {
            if bytes == SENTINEL {
                return Ok(candidate);
            }
        }
    }

    Err(SunSpecError::BaseAddressNotFound { candidates: candidates.to_vec() })
}

/// Walk the model list starting at `base_addr + 2`, building a
/// [`DeviceImage`]. Builds into a fresh [`DeviceImageBuilder`] so a
/// failure partway through never leaves a caller with a half-populated
/// image (`spec.md` §7 — scans are all-or-nothing).
pub async fn scan(
    transport: &mut dyn ModbusTransport,
    base_addr: u16,
    catalog: &Catalog,
) -> Result<DeviceImage, SunSpecError> {
    let mut builder = DeviceImageBuilder::new(base_addr);
    let mut addr = base_addr + 2;

    loop {
        let id_bytes = transport.read_holding(addr, 1).await?;
        let id = u16::from_be_bytes([id_bytes[0], id_bytes[1]]);
        if id == sunspec_core::END_MODEL_ID {
            break;
        }

        let length_bytes = transport.read_holding(addr + 1, 1).await?;
        let length = u16::from_be_bytes([length_bytes[0], length_bytes[1]]);

        let whole = transport.read_holding(addr, length + 2).await?;
        let payload = whole[4..].to_vec();

        let def = catalog.model(id).cloned();
        builder.push_model(id, length, def, &payload);

        addr += length + 2;
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sunspec_core::DeviceImageBuilder;
    use tokio::sync::Mutex;

    use super::*;
    use crate::transport::InMemoryTransport;

    fn server_image() -> DeviceImage {
        let catalog = Catalog::builtin();
        let mut b = DeviceImageBuilder::new(40_000);
        b.push_model(1, 66, catalog.model(1).cloned(), &vec![0u8; 132]);
        b.push_model(17, 12, catalog.model(17).cloned(), &vec![0u8; 24]);
        b.push_model(103, 50, catalog.model(103).cloned(), &vec![0u8; 100]);
        b.push_model(126, 226, catalog.model(126).cloned(), &vec![0u8; 452]);
        b.finish()
    }

    #[tokio::test]
    async fn scan_discovers_models_in_order() {
        let image = Arc::new(Mutex::new(server_image()));
        let mut transport = InMemoryTransport::new(image);
        let base_addr = resolve_base_addr(&mut transport, None, &[40_000, 50_000, 0]).await.unwrap();
        assert_eq!(base_addr, 40_000);

        let scanned = scan(&mut transport, base_addr, &Catalog::builtin()).await.unwrap();
        let ids: Vec<u16> = scanned.models().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![1, 17, 103, 126]);

        let addrs: Vec<u16> = scanned.models().iter().map(|m| m.model_addr()).collect();
        assert_eq!(addrs, vec![40_002, 40_070, 40_084, 40_136]);
    }

    #[tokio::test]
    async fn base_address_not_found_lists_candidates() {
        let image = Arc::new(Mutex::new(server_image()));
        let mut transport = InMemoryTransport::new(image);
        let err = resolve_base_addr(&mut transport, None, &[40_010, 40_020]).await.unwrap_err();
        assert_eq!(err, SunSpecError::BaseAddressNotFound { candidates: vec![40_010, 40_020] });
    }

    #[tokio::test]
    async fn invalid_preset_base_address_reports_value_matching_spec_boundary_case() {
        let image = Arc::new(Mutex::new(server_image()));
        let mut transport = InMemoryTransport::new(image);
        let err = resolve_base_addr(&mut transport, Some(40_001), &[]).await.unwrap_err();
        assert_eq!(
            err,
            SunSpecError::InvalidBaseAddress { address: 40_001, value: b"nS\x00\x01".to_vec() }
        );
    }
}
