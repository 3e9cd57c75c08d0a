//! One-shot HTTP server for provider tests.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

/// Serve exactly one HTTP request on an ephemeral port, answering with
/// `status` and `body`. Returns the URL to hit and a handle yielding the
/// raw request (headers + body) once it has been served.
pub(crate) fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut buf).expect("read request");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = find_header_end(&request) {
                break pos;
            }
            assert!(n > 0, "connection closed before headers were complete");
        };

        let content_length = parse_content_length(&request[..header_end]);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).expect("read body");
            assert!(n > 0, "connection closed before body was complete");
            request.extend_from_slice(&buf[..n]);
        }

        let reason = match status {
            201 => "Created",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            _ => "Status",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}"), handle)
}

fn find_header_end(request: &[u8]) -> Option<usize> {
    request
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn parse_content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0)
}
