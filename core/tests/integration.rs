//! Full scaffold lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`. The base URI is given as
//! an absolute `http://` URL, which the client uses verbatim.

use std::net::SocketAddr;

use scaffold_core::{
    AuthMethod, ClientConfig, ClientError, ExecuteRequest, NormalizedResponse, ScaffoldClient,
};
use serde_json::json;

const KEY: &str = "integration-key";

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, KEY).await
        })
        .unwrap();
    });

    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new("unused.example.com", KEY)
        .with_base_uri(format!("http://{addr}/admin/scaffolds"))
}

#[test]
fn scaffold_lifecycle() {
    let addr = start_server();
    let client = ScaffoldClient::new(config(addr).with_raise_exceptions(true)).unwrap();

    // Step 1: list, empty table.
    let listed = client.list("sites").unwrap().unwrap();
    assert_eq!(listed, NormalizedResponse::List(Vec::new()));

    // Step 2: create two records.
    let created = client.create("sites", &json!({"name": "A", "port": 80})).unwrap().unwrap();
    let created = created.as_object().unwrap();
    assert_eq!(created["name"], json!("A"));
    let id = created["id"].as_u64().unwrap();
    client.create("sites", &json!({"name": "B"})).unwrap();

    // Step 3: show.
    let shown = client.show("sites", id).unwrap().unwrap();
    assert_eq!(shown.as_object().unwrap()["port"], json!(80));

    // Step 4: search.
    let found = client.search("sites", &json!({"search": {"name": "B"}})).unwrap().unwrap();
    assert_eq!(found.as_list().unwrap().len(), 1);

    // Step 5: update.
    let updated = client.update("sites", id, &json!({"port": 443})).unwrap().unwrap();
    assert_eq!(updated.as_object().unwrap()["port"], json!(443));
    assert_eq!(updated.as_object().unwrap()["name"], json!("A"));

    // Step 6: execute on a record and on the class.
    let request = ExecuteRequest::new("rename").on_record_id(id).args(json!(["A2"]));
    let renamed = client.execute("sites", &request).unwrap().unwrap();
    assert_eq!(renamed.as_object().unwrap()["name"], json!("A2"));

    let count = client.execute("sites", &ExecuteRequest::new("count")).unwrap().unwrap();
    assert_eq!(count, NormalizedResponse::Scalar(json!(2)));

    // Step 7: a body that is not JSON comes back raw.
    let banner = client.execute("sites", &ExecuteRequest::new("banner")).unwrap().unwrap();
    assert_eq!(banner.as_raw(), Some("<h1>sites</h1>"));

    // Step 8: destroy; an empty body becomes the success marker.
    let destroyed = client.destroy("sites", id).unwrap().unwrap();
    assert!(destroyed.is_success_marker());

    // Step 9: show after destroy; the status message is raised.
    let err = client.show("sites", id).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Not Found");
}

#[test]
fn failures_are_swallowed_without_raise_exceptions() {
    let addr = start_server();
    let client = ScaffoldClient::new(config(addr)).unwrap();

    assert!(client.show("sites", 12345).unwrap().is_none());
    assert!(client
        .execute("sites", &ExecuteRequest::new("explode"))
        .unwrap()
        .is_none());
}

#[test]
fn query_and_fleet_auth_reach_the_server() {
    let addr = start_server();

    let query = ScaffoldClient::new(
        config(addr)
            .with_auth_method(AuthMethod::Query)
            .with_raise_exceptions(true),
    )
    .unwrap();
    assert!(query.list("sites").unwrap().is_some());

    let fleet = ScaffoldClient::new(config(addr).with_fleet(true).with_raise_exceptions(true)).unwrap();
    assert!(fleet.list("sites").unwrap().is_some());

    let wrong = ScaffoldClient::new(
        ClientConfig::new("unused.example.com", "wrong")
            .with_base_uri(format!("http://{addr}/admin/scaffolds"))
            .with_raise_exceptions(true),
    )
    .unwrap();
    let err = wrong.list("sites").unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Unauthorized");
}

#[test]
fn scoped_base_uri_switches_servers() {
    let primary = start_server();
    let secondary = start_server();
    let client = ScaffoldClient::new(config(primary).with_raise_exceptions(true)).unwrap();

    client.create("sites", &json!({"name": "primary"})).unwrap();

    let secondary_base = format!("http://{secondary}/admin/scaffolds");
    let listed = client.with_base_uri(&secondary_base, |c| c.list("sites"));
    assert_eq!(listed.unwrap().unwrap(), NormalizedResponse::List(Vec::new()));

    let listed = client.list("sites").unwrap().unwrap();
    assert_eq!(listed.as_list().unwrap().len(), 1);
}

#[test]
fn connection_refused_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ScaffoldClient::new(config(addr).with_raise_exceptions(true)).unwrap();
    let err = client.list("sites").unwrap_err();
    assert!(
        matches!(err, ClientError::Transport(_) | ClientError::Timeout(_)),
        "unexpected error: {err:?}"
    );
}
