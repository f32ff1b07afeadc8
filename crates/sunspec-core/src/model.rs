//! A single model's placement and catalog definition within a
//! [`crate::image::DeviceImage`] (`spec.md` §3 "Model instance").

use crate::catalog::{ModelDef, PointDef};
use crate::error::SunSpecError;

/// One model's placement in the device image.
///
/// Carries no byte buffer of its own — `byte_offset` indexes into the
/// owning [`crate::image::DeviceImage`]'s single flat buffer, so reads
/// and writes that span a model boundary (permitted by `spec.md` §3)
/// never have to stitch two buffers together.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub(crate) id: u16,
    pub(crate) length: u16,
    pub(crate) model_addr: u16,
    pub(crate) byte_offset: usize,
    pub(crate) def: Option<ModelDef>,
}

impl ModelInstance {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn model_addr(&self) -> u16 {
        self.model_addr
    }

    /// `None` when the model's id isn't in the catalog — the model is
    /// addressable but not decodable (`spec.md` §4.2).
    pub fn def(&self) -> Option<&ModelDef> {
        self.def.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.def.as_ref().map(|d| d.name.as_str())
    }

    pub fn point_def(&self, name: &str) -> Result<&PointDef, SunSpecError> {
        self.def
            .as_ref()
            .and_then(|d| d.point(name))
            .ok_or_else(|| SunSpecError::Catalog { model_id: self.id, point_name: name.to_string() })
    }

    /// Absolute register address of a point within this model
    /// (`spec.md` §4.2 "Point address").
    pub fn point_address(&self, point: &PointDef) -> u16 {
        self.model_addr + point.offset
    }

    pub(crate) fn byte_range(&self, point: &PointDef) -> std::ops::Range<usize> {
        let start = self.byte_offset + point.offset as usize * 2;
        start..start + point.len as usize * 2
    }
}
