mod common;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use kickstart::actions::EchoAction;
use kickstart::error_page::ErrorMode;
use kickstart::registry::HandlerRegistry;
use kickstart::router::RouteDecl;
use kickstart::server::{HttpServer, MAX_BODY_BYTES};

fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut buf = String::new();
    stream.read_to_string(&mut buf).unwrap();
    buf
}

#[test]
fn test_server_round_trip() {
    let mut registry = HandlerRegistry::new();
    registry.register("echo", EchoAction);
    let dispatcher = Arc::new(common::dispatcher(
        vec![RouteDecl::post("/items/{id:\\d+}", "echo")],
        registry,
        ErrorMode::Production,
    ));

    let handle = HttpServer::new(dispatcher, 2).start("127.0.0.1:0").unwrap();
    handle.wait_ready().unwrap();
    let addr = handle.addr();

    let body = r#"{"qty":3}"#;
    let resp = send(
        addr,
        &format!(
            "POST /items/12?tag=a%20b HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    );
    assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("x-request-id:"));
    assert!(resp.contains(r#""id":"12""#), "{resp}");
    assert!(resp.contains(r#""tag":"a b""#), "{resp}");
    assert!(resp.contains(r#""qty":3"#), "{resp}");

    let resp = send(
        addr,
        "GET /items/12 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 405"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("allow: post"), "{resp}");

    let resp = send(
        addr,
        "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 404"), "{resp}");

    handle.stop();
}

#[test]
fn test_oversized_body_is_refused_without_dispatch() {
    let hits = common::counter();
    let mut registry = HandlerRegistry::new();
    registry.register_shared("upload", common::counting_action("stored", &hits));
    let dispatcher = Arc::new(common::dispatcher(
        vec![RouteDecl::post("/upload", "upload")],
        registry,
        ErrorMode::Production,
    ));

    let handle = HttpServer::new(dispatcher, 1).start("127.0.0.1:0").unwrap();
    handle.wait_ready().unwrap();

    // Valid JSON one string larger than the limit
    let body = format!("\"{}\"", "x".repeat(MAX_BODY_BYTES as usize));
    let mut stream = TcpStream::connect(handle.addr()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let head = format!(
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).unwrap();
    // The server may answer before the whole body is sent
    let _ = stream.write_all(body.as_bytes());
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf);
    let resp = String::from_utf8_lossy(&buf);

    assert!(resp.starts_with("HTTP/1.1 413"), "{resp}");
    assert!(resp.contains("Payload Too Large"), "{resp}");
    assert_eq!(common::hits(&hits), 0);

    // A body at the limit still goes through
    let body = "x".repeat(MAX_BODY_BYTES as usize);
    let resp = send(
        handle.addr(),
        &format!(
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    );
    assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
    assert_eq!(common::hits(&hits), 1);

    handle.stop();
}
