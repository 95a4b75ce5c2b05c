//! Minimal HTTP/1.1 token endpoint for integration tests.
//!
//! The reply is chosen by the `uid` query parameter prefix:
//! `ok*` → 200 with a token, `na*` → 200 with the "N/A" sentinel,
//! `busy*` → 429, `down*` → 503, `garbage*` → 200 with a non-JSON body,
//! `slow*` → 200 after a 3s stall, `flaky*` → 429 on the first request then 200.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Requests seen so far, keyed by uid.
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<HashMap<String, u32>>>);

impl Hits {
    pub fn get(&self, uid: &str) -> u32 {
        self.0.lock().unwrap().get(uid).copied().unwrap_or(0)
    }

    fn bump(&self, uid: &str) -> u32 {
        let mut map = self.0.lock().unwrap();
        let n = map.entry(uid.to_string()).or_insert(0);
        *n += 1;
        *n
    }
}

/// Starts the server in a background thread. Returns the endpoint URL
/// (e.g. "http://127.0.0.1:12345/token") and the hit counter.
pub fn start() -> (String, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Hits::default();
    let server_hits = hits.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let hits = server_hits.clone();
            thread::spawn(move || handle(stream, &hits));
        }
    });
    (format!("http://127.0.0.1:{}/token", port), hits)
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/token", port)
}

fn handle(mut stream: std::net::TcpStream, hits: &Hits) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let params = parse_query(request);
    let uid = params.get("uid").cloned().unwrap_or_default();
    let password = params.get("password").cloned().unwrap_or_default();
    let count = hits.bump(&uid);

    let (status, body) = if password.is_empty() {
        ("400 Bad Request", String::from(r#"{"error":"missing password"}"#))
    } else if uid.starts_with("ok") {
        ("200 OK", format!(r#"{{"token":"tok-{}","uid":"{}"}}"#, uid, uid))
    } else if uid.starts_with("na") {
        ("200 OK", String::from(r#"{"token":"N/A"}"#))
    } else if uid.starts_with("busy") {
        ("429 Too Many Requests", String::from(r#"{"error":"slow down"}"#))
    } else if uid.starts_with("down") {
        ("503 Service Unavailable", String::new())
    } else if uid.starts_with("garbage") {
        ("200 OK", String::from("<html>oops</html>"))
    } else if uid.starts_with("slow") {
        thread::sleep(Duration::from_secs(3));
        ("200 OK", format!(r#"{{"token":"tok-{}"}}"#, uid))
    } else if uid.starts_with("flaky") {
        if count == 1 {
            ("429 Too Many Requests", String::new())
        } else {
            ("200 OK", format!(r#"{{"token":"tok-{}"}}"#, uid))
        }
    } else {
        ("404 Not Found", String::new())
    };

    let response = format!(
        concat!(
            "HTTP/1.1 {}\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: {}\r\n",
            "Connection: close\r\n\r\n{}"
        ),
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Query parameters of the request line (`GET /token?uid=..&password=.. HTTP/1.1`).
fn parse_query(request: &str) -> HashMap<String, String> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("");
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), decode(v)))
        .collect()
}

fn decode(v: &str) -> String {
    let bytes = v.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
