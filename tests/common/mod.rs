// Shared helpers for the integration tests: a tiny HTTP server that records
// every request and answers with a canned status, plus a multipart decoder
// to check what actually went over the wire.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn boundary(&self) -> String {
        self.header("content-type")
            .and_then(|ct| ct.split("boundary=").nth(1))
            .expect("multipart content type")
            .to_string()
    }

    pub fn form(&self) -> Vec<FormPart> {
        parse_form(&self.body, &self.boundary())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

pub struct MockServer {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockServer {
    /// Serve every connection with `status` and `body` until the test ends.
    pub fn start(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, status, body, &log);
            }
        });

        MockServer { url, received }
    }

    pub fn requests(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

// The request is recorded before the response goes out, so the client
// never observes a reply the test cannot see yet.
fn serve(stream: TcpStream, status: u16, body: &str, log: &Mutex<Vec<Received>>) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':')?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut request_body = vec![0u8; length];
    reader.read_exact(&mut request_body).ok()?;
    log.lock().unwrap().push(Received {
        method,
        path,
        headers,
        body: request_body,
    });

    let reason = match status {
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

/// Split a multipart/form-data body into its parts.
pub fn parse_form(body: &[u8], boundary: &str) -> Vec<FormPart> {
    let delimiter = format!("--{boundary}");
    let next_delimiter = format!("\r\n--{boundary}");
    let mut parts = Vec::new();

    let start = find(body, delimiter.as_bytes()).expect("opening boundary");
    let mut rest = &body[start + delimiter.len()..];
    while !rest.starts_with(b"--") {
        rest = rest.strip_prefix(b"\r\n").expect("CRLF after boundary");
        let end = find(rest, next_delimiter.as_bytes()).expect("closing boundary");
        let part = &rest[..end];
        let split = find(part, b"\r\n\r\n").expect("part headers");
        let head = String::from_utf8_lossy(&part[..split]).into_owned();

        parts.push(FormPart {
            name: quoted(&head, "name=\"").expect("part name"),
            filename: quoted(&head, "filename=\""),
            content: part[split + 4..].to_vec(),
        });
        rest = &rest[end + next_delimiter.len()..];
    }
    parts
}

fn quoted(head: &str, key: &str) -> Option<String> {
    // `name="` also occurs inside `filename="`; look for the standalone key.
    let at = head
        .match_indices(key)
        .find(|(i, _)| *i == 0 || !head[..*i].ends_with("file"))?
        .0;
    let value = &head[at + key.len()..];
    value.split('"').next().map(str::to_string)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
