use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cloud_roi_core::InputValues;
use serde_json::{Value, json};

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_json(response: &str) -> Value {
    let body = response.split("\r\n\r\n").nth(1).unwrap_or("");
    serde_json::from_str(body).expect("json body")
}

struct Daemon {
    child: Child,
    addr: String,
    db_path: String,
}

impl Daemon {
    fn start(tag: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let db_path = std::env::temp_dir()
            .join(format!("cloud-roi-http-{tag}-{now}.json"))
            .display()
            .to_string();
        let addr = reserve_addr();

        let child = Command::new(env!("CARGO_BIN_EXE_cloud-roid"))
            .env("CLOUD_ROI_TRANSPORT", "http")
            .env("CLOUD_ROI_HTTP_ADDR", &addr)
            .env("CLOUD_ROI_DB", &db_path)
            .env("CLOUD_ROI_BACKEND", "json")
            .env("CLOUD_ROI_ADVISOR_PROVIDER", "none")
            .env("RUST_LOG", "off")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn cloud-roid");
        wait_for_http(&addr);
        Self {
            child,
            addr,
            db_path,
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.db_path);
    }
}

#[test]
fn health_and_mcp_initialize() {
    let daemon = Daemon::start("health");

    let health = send_http(&daemon.addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    let body = response_json(&health);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["backend"], "json");

    let init_body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
    let init = send_http(&daemon.addr, "POST", "/mcp", init_body);
    assert!(init.starts_with("HTTP/1.1 200"));
    assert_eq!(response_json(&init)["result"]["serverInfo"]["name"], "cloud-roi-mcp");

    let garbage = send_http(&daemon.addr, "POST", "/mcp", "{not json");
    assert!(garbage.starts_with("HTTP/1.1 400"));
    assert_eq!(response_json(&garbage)["error"]["code"], -32700);

    let notification = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    let none = send_http(&daemon.addr, "POST", "/mcp", notification);
    assert!(none.starts_with("HTTP/1.1 204"));
}

#[test]
fn rest_save_load_delete_round_trip() {
    let daemon = Daemon::start("rest");

    let empty = send_http(&daemon.addr, "GET", "/api/load", "");
    assert!(empty.starts_with("HTTP/1.1 200"));
    assert_eq!(response_json(&empty), json!({"success": true, "data": null}));

    let mut inputs = serde_json::to_value(InputValues::default()).expect("inputs");
    inputs["companyName"] = json!("Tailspin Toys");
    let save_body = json!({"inputs": inputs}).to_string();
    let saved = send_http(&daemon.addr, "POST", "/api/save", &save_body);
    assert!(saved.starts_with("HTTP/1.1 200"));
    assert_eq!(
        response_json(&saved),
        json!({"success": true, "id": "tailspin-toys"})
    );

    let loaded = send_http(&daemon.addr, "GET", "/api/load", "");
    let data = &response_json(&loaded)["data"];
    assert_eq!(data["id"], "tailspin-toys");
    assert_eq!(data["inputs"]["companyName"], "Tailspin Toys");
    assert!(data["outputs"]["totalROI"].as_f64().is_some());

    let deleted = send_http(&daemon.addr, "DELETE", "/api/delete/Tailspin%20Toys", "");
    assert!(deleted.starts_with("HTTP/1.1 200"));
    assert_eq!(response_json(&deleted), json!({"success": true}));

    let missing = send_http(&daemon.addr, "DELETE", "/api/delete/Tailspin%20Toys", "");
    assert!(missing.starts_with("HTTP/1.1 404"));
    assert!(response_json(&missing)["error"].is_string());
}

#[test]
fn rest_rejects_bad_bodies_and_routes() {
    let daemon = Daemon::start("errors");

    let bad = send_http(&daemon.addr, "POST", "/api/save", r#"{"inputs":{}}"#);
    assert!(bad.starts_with("HTTP/1.1 400"));
    assert!(response_json(&bad)["error"].is_string());

    let wrong_method = send_http(&daemon.addr, "GET", "/api/save", "");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));

    let unknown = send_http(&daemon.addr, "GET", "/metrics", "");
    assert!(unknown.starts_with("HTTP/1.1 404"));
}
