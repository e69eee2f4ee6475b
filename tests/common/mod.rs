#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Loopback HTTP server answering one canned response per connection, in order.
pub struct StubServer {
    pub base: String,
    handle: JoinHandle<Vec<CapturedRequest>>,
}

impl StubServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                captured.push(read_request(&mut stream));
                let reason = if status == 200 { "OK" } else { "Error" };
                let resp = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(resp.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            captured
        });
        Self { base, handle }
    }

    /// Wait for every canned response to be served and return what was received.
    pub fn finish(self) -> Vec<CapturedRequest> {
        self.handle.join().unwrap()
    }
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before a full request arrived");
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else { continue };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let len = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = head_end + 4;
        if buf.len() < body_start + len {
            continue;
        }
        let body = serde_json::from_slice(&buf[body_start..body_start + len]).unwrap_or(serde_json::Value::Null);
        return CapturedRequest { request_line, headers, body };
    }
}

pub fn chat_response(contents: &[&str]) -> String {
    let choices: Vec<serde_json::Value> = contents
        .iter()
        .enumerate()
        .map(|(i, c)| serde_json::json!({"index": i, "message": {"role": "assistant", "content": c}, "finish_reason": "stop"}))
        .collect();
    serde_json::json!({"id": "chatcmpl-1", "object": "chat.completion", "choices": choices}).to_string()
}

pub fn completion_response(texts: &[&str]) -> String {
    let choices: Vec<serde_json::Value> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| serde_json::json!({"index": i, "text": t, "finish_reason": "stop"}))
        .collect();
    serde_json::json!({"id": "cmpl-1", "object": "text_completion", "choices": choices}).to_string()
}

pub const FILES_JSON: &str = r#"[{"fileName":"index.html","filePath":"./","fileContent":"<h1>Hello</h1>"},{"fileName":"site.css","filePath":"./css/","fileContent":"h1 { color: red; }"}]"#;
