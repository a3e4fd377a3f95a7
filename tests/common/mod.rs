#![allow(dead_code)]
//! Shared test utilities for integration tests.
//!
//! - [`mock_transport`]: scripted in-process transport that records requests
//! - [`serve_once`]: a one-shot HTTP server for driving the binary

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde_json::Value;
use zodiac_sdk::{HttpRequest, HttpResponse, Transport, TransportError};

pub type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

/// Transport answering with `responses` in order. Panics when it runs out.
pub fn mock_transport(responses: Vec<HttpResponse>) -> (Arc<dyn Transport>, RequestLog) {
    let log: RequestLog = Arc::default();
    let queue = Mutex::new(VecDeque::from(responses));
    let seen = log.clone();
    let transport = move |request: HttpRequest| -> Result<HttpResponse, TransportError> {
        seen.lock().unwrap().push(request);
        Ok(queue
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected extra request"))
    };
    (Arc::new(transport), log)
}

/// JSON body of a recorded request.
pub fn request_json(request: &HttpRequest) -> Value {
    serde_json::from_slice(request.body.as_deref().expect("request has a body")).unwrap()
}

/// Accept one connection on a local port, answer it with `status` and a JSON
/// `body`, and hand back the raw request head.
pub fn serve_once(status: u16, body: Value) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/api/v1", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }
        let mut discard = vec![0; content_length];
        reader.read_exact(&mut discard).unwrap();

        let payload = body.to_string();
        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
            payload.len()
        );
        reader.get_mut().write_all(response.as_bytes()).unwrap();
        head
    });

    (base_url, handle)
}
