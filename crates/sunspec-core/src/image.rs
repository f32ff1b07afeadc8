//! The device image: the flat, address-mapped register buffer shared by
//! every model (`spec.md` §3 "Device image").

use crate::catalog::{ModelDef, PointDef};
use crate::codec;
use crate::error::SunSpecError;
use crate::model::ModelInstance;

/// Registers past the last model: `0xFFFF, 0x0000`.
pub const END_MODEL_ID: u16 = 0xFFFF;

/// The four-byte base-address sentinel, `"SunS"`.
pub const SENTINEL: [u8; 4] = *b"SunS";

/// An assembled, address-mapped SunSpec register image.
///
/// Owns one flat byte buffer covering the sentinel, every model's
/// header+payload in insertion order, and the end-of-model marker.
/// Individual [`ModelInstance`]s hold only their placement within this
/// buffer, so a read or write spanning a model boundary is a single
/// slice operation instead of a multi-buffer stitch (`spec.md` §3's
/// "register reads/writes crossing a model boundary are permitted").
#[derive(Debug, Clone)]
pub struct DeviceImage {
    base_addr: u16,
    models: Vec<ModelInstance>,
    buffer: Vec<u8>,
}

impl DeviceImage {
    pub fn base_addr(&self) -> u16 {
        self.base_addr
    }

    pub fn models(&self) -> &[ModelInstance] {
        &self.models
    }

    pub fn model_index_by_id(&self, id: u16) -> Option<usize> {
        self.models.iter().position(|m| m.id() == id)
    }

    pub fn model_index_by_name(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name() == Some(name))
    }

    pub fn model(&self, index: usize) -> &ModelInstance {
        &self.models[index]
    }

    pub fn model_by_id(&self, id: u16) -> Option<&ModelInstance> {
        self.model_index_by_id(id).map(|i| &self.models[i])
    }

    pub fn model_by_name(&self, name: &str) -> Option<&ModelInstance> {
        self.model_index_by_name(name).map(|i| &self.models[i])
    }

    pub fn total_registers(&self) -> u16 {
        (self.buffer.len() / 2) as u16
    }

    /// Exclusive end of the valid address range.
    pub fn end_addr(&self) -> u16 {
        self.base_addr + self.total_registers()
    }

    /// `spec.md` §4.3's `validate`: true iff `base_addr <= addr` and
    /// `addr + count <= end_addr`, and `count` is nonzero.
    pub fn validate(&self, addr: u16, count: u16) -> bool {
        count > 0
            && addr >= self.base_addr
            && (addr as u32 + count as u32) <= self.end_addr() as u32
    }

    pub fn read_slice(&self, addr: u16, count: u16) -> Result<&[u8], SunSpecError> {
        if !self.validate(addr, count) {
            return Err(SunSpecError::OutOfRange { addr, count, end_addr: self.end_addr() });
        }
        let start = 2 * (addr - self.base_addr) as usize;
        Ok(&self.buffer[start..start + 2 * count as usize])
    }

    /// `bytes.len()` must be even; `count = bytes.len() / 2` registers
    /// are replaced, per the Open Question pinned in `spec.md` §9.
    pub fn write_slice(&mut self, addr: u16, bytes: &[u8]) -> Result<(), SunSpecError> {
        let count = (bytes.len() / 2) as u16;
        if !self.validate(addr, count) {
            return Err(SunSpecError::OutOfRange { addr, count, end_addr: self.end_addr() });
        }
        let start = 2 * (addr - self.base_addr) as usize;
        self.buffer[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn raw_bytes(&self, model_index: usize, point: &PointDef) -> &[u8] {
        let range = self.models[model_index].byte_range(point);
        &self.buffer[range]
    }

    pub fn set_raw_bytes(&mut self, model_index: usize, point: &PointDef, bytes: &[u8]) {
        let range = self.models[model_index].byte_range(point);
        self.buffer[range].copy_from_slice(bytes);
    }

    pub fn decode_point(&self, model_index: usize, point: &PointDef) -> i64 {
        codec::decode(point.ty, self.raw_bytes(model_index, point))
    }

    pub fn encode_point(&mut self, model_index: usize, point: &PointDef, raw: i64) {
        let bytes = codec::encode(point.ty, raw, point.len);
        self.set_raw_bytes(model_index, point, &bytes);
    }

    pub fn decode_point_str(&self, model_index: usize, point: &PointDef) -> String {
        codec::decode_str(self.raw_bytes(model_index, point))
    }

    pub fn encode_point_str(&mut self, model_index: usize, point: &PointDef, value: &str) {
        let bytes = codec::encode_str(value, point.len);
        self.set_raw_bytes(model_index, point, &bytes);
    }

    /// Points in `model_index`'s model whose `sf` names `sf_point_name`
    /// (`spec.md` §4.2 step 3, scale-factor idempotence).
    pub fn dependents_of<'a>(
        &'a self,
        model_index: usize,
        sf_point_name: &'a str,
    ) -> impl Iterator<Item = &'a PointDef> + 'a {
        self.models[model_index]
            .def()
            .into_iter()
            .flat_map(|d| d.points.iter())
            .filter(move |p| p.sf.as_deref() == Some(sf_point_name))
    }
}

/// Builds a [`DeviceImage`] one model at a time, in insertion order —
/// used both by the server's assembly (`spec.md` §4.3 F) and by the
/// client's scan (`spec.md` §4.2), which discover models sequentially
/// off the wire.
pub struct DeviceImageBuilder {
    base_addr: u16,
    buffer: Vec<u8>,
    models: Vec<ModelInstance>,
}

impl DeviceImageBuilder {
    pub fn new(base_addr: u16) -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&SENTINEL);
        DeviceImageBuilder { base_addr, buffer, models: Vec::new() }
    }

    /// Append a model's header and payload. `payload` must be exactly
    /// `length * 2` bytes; callers building an empty server-side image
    /// pass zeroed payload, callers building a client-side scanned image
    /// pass the bytes read off the wire.
    pub fn push_model(&mut self, id: u16, length: u16, def: Option<ModelDef>, payload: &[u8]) -> &mut Self {
        debug_assert_eq!(payload.len(), length as usize * 2);

        let model_addr = self.base_addr + (self.buffer.len() / 2) as u16;
        let byte_offset = self.buffer.len();

        self.buffer.extend_from_slice(&id.to_be_bytes());
        self.buffer.extend_from_slice(&length.to_be_bytes());
        self.buffer.extend_from_slice(payload);

        self.models.push(ModelInstance { id, length, model_addr, byte_offset, def });
        self
    }

    pub fn finish(mut self) -> DeviceImage {
        self.buffer.extend_from_slice(&END_MODEL_ID.to_be_bytes());
        self.buffer.extend_from_slice(&0u16.to_be_bytes());
        DeviceImage { base_addr: self.base_addr, models: self.models, buffer: self.buffer }
    }
}
