#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

#[derive(Clone)]
pub struct ResponseChunk {
    pub delay_ms: u64,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub enum ScriptedResponse {
    Respond {
        status: u16,
        chunks: Vec<ResponseChunk>,
    },
    /// Send a `200` header and `chunks`, then drop the connection mid-body.
    CutOff { chunks: Vec<ResponseChunk> },
    /// Read the request and hold the connection without answering.
    Stall { delay_ms: u64 },
    Reset,
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn path(&self) -> &str {
        self.request_line.split_whitespace().nth(1).unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

pub struct ScriptedServer {
    pub base_url: String,
    request_count: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let disconnects = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let disconnects = Arc::clone(&disconnects);
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let connection = Connection {
                        scripts: Arc::clone(&scripts),
                        request_count: Arc::clone(&request_count),
                        disconnects: Arc::clone(&disconnects),
                        requests: Arc::clone(&requests),
                    };
                    tokio::spawn(connection.serve(socket));
                }
            }
        });

        Self {
            base_url,
            request_count,
            disconnects,
            requests,
            handle,
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Wait until the client has closed `count` connections mid-response.
    pub async fn wait_for_disconnects(&self, count: usize) -> bool {
        timeout(Duration::from_secs(5), async {
            while self.disconnects.load(Ordering::Acquire) < count {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn response_json(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        chunks: vec![ResponseChunk {
            delay_ms: 0,
            bytes: body.as_bytes().to_vec(),
        }],
    }
}

pub fn response_chunks(chunks: &[(u64, &str)]) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status: 200,
        chunks: chunks
            .iter()
            .map(|(delay_ms, text)| ResponseChunk {
                delay_ms: *delay_ms,
                bytes: text.as_bytes().to_vec(),
            })
            .collect(),
    }
}

struct Connection {
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Connection {
    async fn serve(self, mut socket: TcpStream) {
        let request = match read_request(&mut socket).await {
            Ok(Some(request)) => request,
            _ => return,
        };
        self.requests.lock().expect("requests lock").push(request);

        let index = self.request_count.fetch_add(1, Ordering::AcqRel);
        let response = self
            .scripts
            .get(index)
            .cloned()
            .unwrap_or_else(|| response_json(500, r#"{"error":"unexpected request"}"#));

        let (status, chunks, terminate) = match response {
            ScriptedResponse::Reset => return,
            ScriptedResponse::Stall { delay_ms } => {
                self.pause_unless_closed(&mut socket, delay_ms).await;
                return;
            }
            ScriptedResponse::Respond { status, chunks } => (status, chunks, true),
            ScriptedResponse::CutOff { chunks } => (200, chunks, false),
        };

        let headers = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
            status_reason(status),
        );
        if socket.write_all(headers.as_bytes()).await.is_err() {
            return;
        }

        for chunk in chunks {
            if chunk.delay_ms > 0 && !self.pause_unless_closed(&mut socket, chunk.delay_ms).await {
                return;
            }
            let prefix = format!("{:X}\r\n", chunk.bytes.len());
            if socket.write_all(prefix.as_bytes()).await.is_err()
                || socket.write_all(&chunk.bytes).await.is_err()
                || socket.write_all(b"\r\n").await.is_err()
            {
                self.disconnects.fetch_add(1, Ordering::AcqRel);
                return;
            }
        }

        if terminate {
            let _ = socket.write_all(b"0\r\n\r\n").await;
        }
        let _ = socket.shutdown().await;
    }

    /// Sleep for `delay_ms`, returning false early if the client hangs up.
    async fn pause_unless_closed(&self, socket: &mut TcpStream, delay_ms: u64) -> bool {
        let mut scratch = [0_u8; 64];
        tokio::select! {
            _ = sleep(Duration::from_millis(delay_ms)) => true,
            read = socket.read(&mut scratch) => {
                if matches!(read, Ok(0) | Err(_)) {
                    self.disconnects.fetch_add(1, Ordering::AcqRel);
                    return false;
                }
                sleep(Duration::from_millis(delay_ms)).await;
                true
            }
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<CapturedRequest>> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 2048];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(None);
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(position) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = raw[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
    }

    Ok(Some(CapturedRequest {
        request_line,
        headers,
        body,
    }))
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
