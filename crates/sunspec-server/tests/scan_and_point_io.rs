//! Full-stack integration tests: a real `sunspec-server` listening on a
//! loopback socket, driven by a real `sunspec-client::Client` (`spec.md`
//! §8's end-to-end scenarios).

use sunspec_client::Client;
use sunspec_core::Catalog;
use sunspec_server::{ModelSummary, Server, ServerConfig};
use tokio::net::TcpListener;

async fn spawn_server() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig::new(
        40_000,
        vec![
            ModelSummary::new(1, 66),
            ModelSummary::new(17, 12),
            ModelSummary::new(103, 50),
            ModelSummary::new(126, 226),
        ],
    );
    let server = Server::build(config, &Catalog::builtin());

    // Pre-seed model 103's scale factor so reads exercise the
    // scale-factor path immediately after connecting.
    let context = server.context();
    let w_sf_model = server.model(103u16).unwrap();
    let w_sf = w_sf_model.point_def("W_SF").unwrap();
    let addr_reg = w_sf_model.point_address(w_sf);
    context.set_values(addr_reg, &(-2i16).to_be_bytes()).await.unwrap();
    let w = w_sf_model.point_def("W").unwrap();
    let addr_reg = w_sf_model.point_address(w);
    context.set_values(addr_reg, &27_300i16.to_be_bytes()).await.unwrap();

    tokio::spawn(async move {
        server.serve(listener).await.unwrap();
    });

    addr
}

#[tokio::test]
async fn scan_discovers_every_model_matching_scenario_1() {
    let addr = spawn_server().await;
    let mut client = Client::open(&addr.ip().to_string(), addr.port()).await.unwrap();
    client.set_base_addr(40_000);
    client.scan().await.unwrap();

    let ids: Vec<u16> = client.image().unwrap().models().iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec![1, 17, 103, 126]);
}

#[tokio::test]
async fn read_point_with_scale_factor_matches_scenario_4() {
    let addr = spawn_server().await;
    let mut client = Client::open(&addr.ip().to_string(), addr.port()).await.unwrap();
    client.set_base_addr(40_000);
    client.scan().await.unwrap();

    let value = client.read_point(103u16, "W").await.unwrap();
    assert_eq!(value, 273.0);
}

#[tokio::test]
async fn write_then_read_point_round_trips() {
    let addr = spawn_server().await;
    let mut client = Client::open(&addr.ip().to_string(), addr.port()).await.unwrap();
    client.set_base_addr(40_000);
    client.scan().await.unwrap();

    client.write_point(103u16, "W", 150.0).await.unwrap();
    let value = client.read_point(103u16, "W").await.unwrap();
    assert_eq!(value, 150.0);
}

#[tokio::test]
async fn out_of_range_register_read_surfaces_as_modbus_exception_matching_scenario_5() {
    let addr = spawn_server().await;
    let mut client = Client::open(&addr.ip().to_string(), addr.port()).await.unwrap();

    let err = client.read_registers(9_999, 1).await.unwrap_err();
    match err {
        sunspec_core::SunSpecError::ModbusException { exception_code, .. } => assert_eq!(exception_code, 0x02),
        other => panic!("unexpected error: {other:?}"),
    }
}
