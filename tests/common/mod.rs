//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Handle to a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream on an ephemeral port that answers every request
/// with `status` and `body`, after an optional `delay`.
pub async fn start_mock_upstream(status: u16, body: &'static str, delay: Duration) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let captured = captured.clone();
                    tokio::spawn(async move {
                        handle(socket, captured, status, body, delay).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream { addr, requests }
}

async fn handle(
    mut socket: TcpStream,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    status: u16,
    body: &'static str,
    delay: Duration,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    captured.lock().unwrap().push(request);

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    Some(CapturedRequest {
        method,
        path,
        content_type,
        body,
    })
}

/// The eight-event sample response used across tests.
#[allow(dead_code)]
pub const SAMPLE_PAYLOAD: &str = r##"{
	"count": 1,
	"order_code": "some order code",
	"orderInfo": {
		"ship_type_code": "some ship type code",
		"tracking_number": "some tracking number",
		"tracking_number_usps": "some usps tracking number",
		"numbers": 1,
		"weight": "",
		"order_id": "",
		"order_code": "WW6404007290132",
		"customer_order_code": "#29516",
		"sender_country": {
			"cn_name": "中国"
		},
		"country": {
			"cn_name": "英国"
		}
	},
	"track_status": 1,
	"tracking_len": 8,
	"trackingList": [
		{"date": "08\/06\/2020 14:45:00", "location": " ", "statu": "Flight has arrived"},
		{"date": "08\/06\/2020 11:22:02", "location": "gb", "statu": "pre-advice"},
		{"date": "08\/03\/2020 13:12:00", "location": " ", "statu": "Flight has taken off"},
		{"date": "07\/31\/2020 11:04:43", "location": "Shenzhen", "statu": "Departured from SFC warehouse"},
		{"date": "07\/30\/2020 18:20:09", "location": "shenzhen", "statu": "Arrive SFC warehouse in processing"},
		{"date": "07\/30\/2020 09:12:33", "location": "Shenzhen", "statu": "SFC driver pick-up"},
		{"date": "07\/29\/2020 20:06:56", "location": " ", "statu": "Shipment information sent to SFC"},
		{"date": "07\/29\/2020 20:06:55", "location": " ", "statu": "SHIPMENT INFORMATION SUBMITTED"}
	]
}"##;

/// Non-pooled client that ignores proxy environment variables.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
