//! Minimal HTTP/1.1 stand-in for the GOTOES site, for integration tests.
//!
//! Serves the landing page, the upload reply, the download form and the
//! download itself from fixed bodies, and records every request so tests can
//! check headers, cookies and bodies. One connection per request.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const TOKEN: &str = "abcdef0123456789abcdef0123456789";
pub const FILE_ID: &str = "8009945965089910";
pub const SESSION_COOKIE: &str = "PHPSESSID=test-session";

const LANDING_PATH: &str = "/gotoes/strava/Add_Timestamps_To_GPX.php";
const UPLOAD_PATH: &str = "/gotoes/strava/upload.php";

/// Canned responses. `Default` is a healthy service.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub landing_page: String,
    pub landing_delay: Option<Duration>,
    pub upload_status: u16,
    pub upload_reply: String,
    pub form_page: String,
    pub download_status: u16,
    pub download_body: Vec<u8>,
    /// Announce more download bytes than are sent, then hang up.
    pub download_cut_short: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            landing_page: format!(
                r#"<html><body><h1>Add Timestamps To GPX</h1>
                <a href="https://gotoes.org/strava/uploadtool.php?pif={TOKEN}">Start</a>
                </body></html>"#
            ),
            landing_delay: None,
            upload_status: 200,
            upload_reply: format!(
                r#"{{"count":"<a href=\"uploadProgress.php?f={FILE_ID}\">Continue</a>"}}"#
            ),
            form_page: format!(
                r#"<html><body>
                <form name="combineParameters" method="post" action="upload.php">
                  <input type="hidden" name="f" value="{FILE_ID}">
                  <input type="hidden" name="desiredSpeed" value="25">
                  <input type="hidden" name="outputFormat" value="TCX">
                  <input type="hidden" name="track[]" value="a">
                  <input type="hidden" name="track[]" value="b">
                  <input type="submit" name="go" value="Download">
                </form></body></html>"#
            ),
            download_status: 200,
            download_body: b"<?xml version=\"1.0\"?><gpx><trk><trkseg>\
<trkpt lat=\"48.85\" lon=\"2.35\"><time>2024-05-01T06:00:00Z</time></trkpt>\
</trkseg></trk></gpx>"
                .to_vec(),
            download_cut_short: false,
        }
    }
}

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string.
    pub target: String,
    /// Header names lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct MockGotoes {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockGotoes {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start(opts: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let opts = Arc::new(opts);

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let opts = Arc::clone(&opts);
                let log = Arc::clone(&log);
                thread::spawn(move || handle(stream, &opts, &log));
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, opts: &ServerOptions, log: &Mutex<Vec<Recorded>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    log.lock().unwrap().push(req.clone());

    let path = req.target.split('?').next().unwrap_or("");
    let content_type = req.header("content-type").unwrap_or("").to_string();

    let mut announced_extra = 0;
    let (status, headers, body): (u16, Vec<(&str, String)>, Vec<u8>) =
        match (req.method.as_str(), path) {
            ("GET", LANDING_PATH) => {
                if let Some(delay) = opts.landing_delay {
                    thread::sleep(delay);
                }
                (
                    200,
                    vec![
                        ("Content-Type", "text/html".into()),
                        ("Set-Cookie", format!("{SESSION_COOKIE}; Path=/")),
                    ],
                    opts.landing_page.clone().into_bytes(),
                )
            }
            ("POST", UPLOAD_PATH) if content_type.starts_with("multipart/form-data") => (
                opts.upload_status,
                vec![("Content-Type", "text/html".into())],
                opts.upload_reply.clone().into_bytes(),
            ),
            ("GET", UPLOAD_PATH) => (
                200,
                vec![("Content-Type", "text/html".into())],
                opts.form_page.clone().into_bytes(),
            ),
            ("POST", UPLOAD_PATH) => {
                if opts.download_cut_short {
                    announced_extra = 100;
                }
                (
                    opts.download_status,
                    vec![("Content-Type", "application/gpx+xml".into())],
                    opts.download_body.clone(),
                )
            }
            _ => (404, vec![], b"not found".to_vec()),
        };

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        reason(status),
        body.len() + announced_extra
    );
    for (name, value) in headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Read one request, honouring Content-Length or chunked encoding.
fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?.to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let mut body = buf[header_end + 4..].to_vec();
    let header = |name: &str| {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    };

    if let Some(len) = header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(len);
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body = dechunk(&body);
    }

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(line_end) = find(raw, b"\r\n") {
        let size_str = std::str::from_utf8(&raw[..line_end]).unwrap_or("0");
        let size = usize::from_str_radix(size_str.split(';').next().unwrap_or("0").trim(), 16)
            .unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = (start + size).min(raw.len());
        out.extend_from_slice(&raw[start..end]);
        raw = &raw[(end + 2).min(raw.len())..];
    }
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
