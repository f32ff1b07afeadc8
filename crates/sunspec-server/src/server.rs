//! Top-level server handle (`spec.md` §6): assembles the device image
//! and drives accepted TCP connections through [`SunSpecService`].

use std::sync::Arc;

use sunspec_core::error::SunSpecError;
use sunspec_core::{Catalog, ModelInstance};
use tokio::net::TcpListener;
use tokio_modbus::server::tcp::{accept_tcp_connection, Server as TcpServer};

use crate::assembly::{self, ServerConfig};
use crate::service::SunSpecService;
use crate::slave_context::SlaveContext;

/// Selector for [`Server::model`]: a model id or its catalog name,
/// mirroring [`sunspec_client::ModelKey`].
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

/// A SunSpec server: one materialized device image, shared by every
/// accepted connection (`spec.md` §5 — one `Arc<SlaveContext>`, one
/// `tokio::task` per connection).
pub struct Server {
    context: Arc<SlaveContext>,
    models: Vec<ModelInstance>,
}

impl Server {
    /// Assemble the device image once from `config` (`spec.md` §4.3
    /// component F, §3's "constructed once" lifecycle).
    pub fn build(config: ServerConfig, catalog: &Catalog) -> Self {
        let image = assembly::assemble(&config, catalog);
        let models = image.models().to_vec();
        Server { context: SlaveContext::new(image), models }
    }

    pub fn model<'k>(&self, key: impl Into<ModelKey<'k>>) -> Option<&ModelInstance> {
        match key.into() {
            ModelKey::Id(id) => self.models.iter().find(|m| m.id() == id),
            ModelKey::Name(name) => self.models.iter().find(|m| m.name() == Some(name)),
        }
    }

    pub fn context(&self) -> Arc<SlaveContext> {
        self.context.clone()
    }

    /// Accept connections off `listener` until it closes or a transport
    /// error aborts the loop, servicing each with a [`SunSpecService`]
    /// sharing this server's [`SlaveContext`] (`spec.md` §5, §6).
    pub async fn serve(&self, listener: TcpListener) -> Result<(), SunSpecError> {
        let server = TcpServer::new(listener);
        let context = self.context.clone();
        let on_connected = |stream, socket_addr| {
            let context = context.clone();
            async move {
                let new_service = move |_socket_addr| Ok(Some(SunSpecService::new(context.clone())));
                accept_tcp_connection(stream, socket_addr, new_service)
            }
        };
        let on_process_error = |err| log::warn!("connection error: {err}");
        server.serve(&on_connected, on_process_error).await.map_err(|e| SunSpecError::Io(e.to_string()))
    }
}
