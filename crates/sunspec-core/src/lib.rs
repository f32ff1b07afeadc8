//! SunSpec device model: the typed register catalog, pure codec
//! functions, and the address-mapped device image shared by the
//! SunSpec client and server.
//!
//! See `SPEC_FULL.md` §4.1-§4.3 for the design this crate implements.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod image;
pub mod model;
pub mod types;

pub use catalog::{Catalog, ModelDef, PointDef};
pub use error::SunSpecError;
pub use image::{DeviceImage, DeviceImageBuilder, END_MODEL_ID, SENTINEL};
pub use model::ModelInstance;
pub use types::PointType;
