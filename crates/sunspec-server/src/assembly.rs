//! Server-side device image assembly (`spec.md` §4.3 component F):
//! turn a list of model summaries into a freshly materialized
//! [`DeviceImage`], assembled once and mutated only through point or
//! range writes from then on.

use sunspec_core::{Catalog, DeviceImage, DeviceImageBuilder};

/// One model to place in the assembled image: its id and register
/// length. The catalog definition, if any, is resolved at build time so
/// the server can decode/encode named points as well as raw ranges.
#[derive(Debug, Clone, Copy)]
pub struct ModelSummary {
    pub id: u16,
    pub length: u16,
}

impl ModelSummary {
    pub fn new(id: u16, length: u16) -> Self {
        ModelSummary { id, length }
    }
}

/// Configuration surface for [`crate::Server::build`]: which models to
/// place, in order, and the catalog to resolve their point layouts
/// against.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_addr: u16,
    pub model_summaries: Vec<ModelSummary>,
}

impl ServerConfig {
    pub fn new(base_addr: u16, model_summaries: Vec<ModelSummary>) -> Self {
        ServerConfig { base_addr, model_summaries }
    }
}

/// Assemble a [`DeviceImage`] from a [`ServerConfig`], zero-filling
/// every model's payload (`spec.md` §3's "model instance buffers are
/// zero-initialized until written").
pub fn assemble(config: &ServerConfig, catalog: &Catalog) -> DeviceImage {
    let mut builder = DeviceImageBuilder::new(config.base_addr);
    for summary in &config.model_summaries {
        let def = catalog.model(summary.id).cloned();
        let payload = vec![0u8; summary.length as usize * 2];
        builder.push_model(summary.id, summary.length, def, &payload);
    }
    builder.finish()
}
