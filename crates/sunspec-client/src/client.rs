//! The client-facing API surface (`spec.md` §6): `open`, `scan`, point
//! I/O, and raw register access, plus model lookup by id or name.

use sunspec_core::error::SunSpecError;
use sunspec_core::{Catalog, DeviceImage, ModelInstance};

use crate::point_io;
use crate::scan;
use crate::transport::{ModbusTransport, TcpTransport};

/// Default base-address candidate list (`spec.md` §4.2).
pub const DEFAULT_BASE_CANDIDATES: [u16; 3] = [40_000, 50_000, 0];

/// Scan configuration: the ordered list of base-address candidates tried
/// when no base address has been pre-set.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base_candidates: Vec<u16>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig { base_candidates: DEFAULT_BASE_CANDIDATES.to_vec() }
    }
}

/// Selector for [`Client::model`] / [`Client::model_mut`]: a model id or
/// its catalog name.
pub enum ModelKey<'a> {
    Id(u16),
    Name(&'a str),
}

impl From<u16> for ModelKey<'static> {
    fn from(id: u16) -> Self {
        ModelKey::Id(id)
    }
}

impl<'a> From<&'a str> for ModelKey<'a> {
    fn from(name: &'a str) -> Self {
        ModelKey::Name(name)
    }
}

/// A SunSpec client over any [`ModbusTransport`] — a live
/// `TcpTransport` in production, or an in-memory transport in tests.
pub struct Client<T: ModbusTransport> {
    transport: T,
    config: ScanConfig,
    preset_base_addr: Option<u16>,
    catalog: Catalog,
    image: Option<DeviceImage>,
}

impl Client<TcpTransport> {
    /// Open a connection to `host:port`. Mirrors `spec.md` §6's
    /// `open(host, port) -> Client`; scanning is a separate call so
    /// callers can inspect/override `base_candidates` first.
    pub async fn open(host: &str, port: u16) -> Result<Self, SunSpecError> {
        let transport = TcpTransport::connect(host, port).await?;
        Ok(Client::with_transport(transport))
    }
}

impl<T: ModbusTransport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Client {
            transport,
            config: ScanConfig::default(),
            preset_base_addr: None,
            catalog: Catalog::builtin(),
            image: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_base_candidates(mut self, candidates: Vec<u16>) -> Self {
        self.config.base_candidates = candidates;
        self
    }

    pub fn set_base_addr(&mut self, addr: u16) {
        self.preset_base_addr = Some(addr);
    }

    pub fn image(&self) -> Option<&DeviceImage> {
        self.image.as_ref()
    }

    /// Resolve the base address, walk the model list, and replace the
    /// client's device image only once the whole scan succeeds
    /// (`spec.md` §4.2, §7 — all-or-nothing).
    pub async fn scan(&mut self) -> Result<(), SunSpecError> {
        let base_addr =
            scan::resolve_base_addr(&mut self.transport, self.preset_base_addr, &self.config.base_candidates)
                .await?;
        let image = scan::scan(&mut self.transport, base_addr, &self.catalog).await?;
        self.preset_base_addr = Some(base_addr);
        self.image = Some(image);
        Ok(())
    }

    pub fn model<'k>(&self, key: impl Into<ModelKey<'k>>) -> Option<&ModelInstance> {
        let image = self.image.as_ref()?;
        match key.into() {
            ModelKey::Id(id) => image.model_by_id(id),
            ModelKey::Name(name) => image.model_by_name(name),
        }
    }

    fn model_index(&self, key: ModelKey<'_>) -> Result<usize, SunSpecError> {
        let image = self.image.as_ref().ok_or(SunSpecError::Reuse)?;
        match key {
            ModelKey::Id(id) => image
                .model_index_by_id(id)
                .ok_or_else(|| SunSpecError::Catalog { model_id: id, point_name: String::new() }),
            ModelKey::Name(name) => image
                .model_index_by_name(name)
                .ok_or_else(|| SunSpecError::Catalog { model_id: 0, point_name: name.to_string() }),
        }
    }

    /// Read a point, transparently refreshing its scale factor first
    /// (`spec.md` §4.2).
    pub async fn read_point<'k>(&mut self, model: impl Into<ModelKey<'k>>, point_name: &str) -> Result<f64, SunSpecError> {
        let index = self.model_index(model.into())?;
        let image = self.image.as_mut().ok_or(SunSpecError::Reuse)?;
        point_io::read_point(&mut self.transport, image, index, point_name).await
    }

    pub async fn read_point_string<'k>(
        &mut self,
        model: impl Into<ModelKey<'k>>,
        point_name: &str,
    ) -> Result<String, SunSpecError> {
        let index = self.model_index(model.into())?;
        let image = self.image.as_mut().ok_or(SunSpecError::Reuse)?;
        point_io::read_point_string(&mut self.transport, image, index, point_name).await
    }

    pub async fn write_point<'k>(
        &mut self,
        model: impl Into<ModelKey<'k>>,
        point_name: &str,
        value: f64,
    ) -> Result<(), SunSpecError> {
        let index = self.model_index(model.into())?;
        let image = self.image.as_mut().ok_or(SunSpecError::Reuse)?;
        point_io::write_point(&mut self.transport, image, index, point_name, value).await
    }

    /// Raw ranged register read, bypassing the local device image
    /// entirely (`spec.md` §6).
    pub async fn read_registers(&mut self, addr: u16, count: u16) -> Result<Vec<u8>, SunSpecError> {
        self.transport.read_holding(addr, count).await
    }

    pub async fn write_registers(&mut self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError> {
        self.transport.write_holding(addr, bytes).await
    }
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
    async fn scan_then_point_address_matches_scenario_2() {
        let transport = InMemoryTransport::new(Arc::new(Mutex::new(server_image())));
        let mut client = Client::with_transport(transport);

        client.scan().await.unwrap();

        let model = client.model(17u16).unwrap();
        let point = model.point_def("Bits").unwrap();
        assert_eq!(model.point_address(point), 40_078);
    }

    #[tokio::test]
    async fn register_round_trip_matches_scenario_3() {
        let shared = Arc::new(Mutex::new(server_image()));
        let transport = InMemoryTransport::new(shared.clone());
        let mut client = Client::with_transport(transport);
        client.scan().await.unwrap();

        let model = client.model(1u16).unwrap();
        let point = model.point_def("DA").unwrap().clone();
        let addr = model.point_address(&point);

        client.write_registers(addr, &[0xAB, 0x98]).await.unwrap();
        let read_back = client.read_registers(addr, 1).await.unwrap();
        assert_eq!(read_back, vec![0xAB, 0x98]);
        assert_eq!(sunspec_core::codec::decode(point.ty, &read_back), 43928);
    }

    #[tokio::test]
    async fn reading_out_of_range_yields_modbus_exception() {
        let shared = Arc::new(Mutex::new(server_image()));
        let transport = InMemoryTransport::new(shared.clone());
        let mut client = Client::with_transport(transport);

        let err = client.read_registers(0, 1).await.unwrap_err();
        match err {
            SunSpecError::ModbusException { exception_code, .. } => assert_eq!(exception_code, 0x02),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
