//! Minimal HTTP/1.1 surface: JSON-RPC at `/mcp` plus the REST routes the
//! calculator front end saves and loads through.

use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use serde_json::{Value, json};

use crate::protocol::{JsonRpcRequest, PARSE_ERROR};
use crate::server::{Failure, RoiServer, SaveArgs};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// How long a connection may stall before it is dropped. Connections are
/// served one at a time, so an idle client would otherwise block the rest.
#[cfg(not(test))]
const READ_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const READ_TIMEOUT: Duration = Duration::from_millis(200);

impl RoiServer {
    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve_listener(&listener)
    }

    /// Accepts connections one at a time until the listener fails.
    pub fn serve_listener(&self, listener: &TcpListener) -> io::Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "cloud-roi http listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        tracing::warn!(error = %err, "http request error");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let Some(req) = read_http_request(&stream)? else {
            return Ok(());
        };
        tracing::debug!(method = %req.method, path = %req.path, "http request");
        let response = self.dispatch_http_request(&req);
        write_http_response(&mut stream, &response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/health") => match self.storage_stats() {
                Ok(stats) => HttpResponse::json(200, json!({"status": "ok", "storage": stats})),
                Err(failure) => failure_response(&failure),
            },
            ("POST", "/mcp" | "/") => self.dispatch_json_rpc(&req.body),
            ("POST", "/api/save") => self.api_save(&req.body),
            ("GET", "/api/load") => match self.latest_record() {
                Ok(record) => HttpResponse::json(200, json!({"success": true, "data": record})),
                Err(failure) => failure_response(&failure),
            },
            ("DELETE", path) if path.starts_with("/api/delete/") => {
                let raw = path.trim_start_matches("/api/delete/");
                match percent_decode(raw) {
                    Some(company_name) => self.api_delete(&company_name),
                    None => HttpResponse::json(
                        400,
                        json!({"error": "company name is not valid percent-encoded UTF-8"}),
                    ),
                }
            }
            (_, "/health" | "/mcp" | "/" | "/api/save" | "/api/load") => HttpResponse::json(
                405,
                json!({"error": "method_not_allowed", "message": format!("{} is not supported on {}", req.method, req.path)}),
            ),
            _ => HttpResponse::json(
                404,
                json!({"error": "not_found", "message": "supported endpoints: GET /health, POST /mcp, POST /api/save, GET /api/load, DELETE /api/delete/{companyName}"}),
            ),
        }
    }

    fn dispatch_json_rpc(&self, body: &[u8]) -> HttpResponse {
        let rpc: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(
                    400,
                    json!({"jsonrpc": "2.0", "id": Value::Null, "error": {"code": PARSE_ERROR, "message": format!("parse error: {err}")}}),
                );
            }
        };
        match self.handle_request(rpc) {
            Some(v) => match serde_json::to_value(v) {
                Ok(payload) => HttpResponse::json(200, payload),
                Err(_) => HttpResponse::json(
                    500,
                    json!({"error": "internal_error", "message": "failed to serialize rpc response"}),
                ),
            },
            None => HttpResponse::empty(204),
        }
    }

    fn api_save(&self, body: &[u8]) -> HttpResponse {
        let args: SaveArgs = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(400, json!({"error": format!("invalid request body: {err}")}));
            }
        };
        match self.save_record(args.inputs, args.outputs, args.timestamp) {
            Ok((record, _)) => HttpResponse::json(200, json!({"success": true, "id": record.id})),
            Err(failure) => failure_response(&failure),
        }
    }

    fn api_delete(&self, company_name: &str) -> HttpResponse {
        match self.delete_record(company_name) {
            Ok((true, _)) => HttpResponse::json(200, json!({"success": true})),
            Ok((false, key)) => HttpResponse::json(
                404,
                json!({"error": format!("no saved calculation for {key}")}),
            ),
            Err(failure) => failure_response(&failure),
        }
    }
}

fn failure_response(failure: &Failure) -> HttpResponse {
    let mut body = json!({"error": failure.message});
    if let (Some(data), Some(obj)) = (&failure.data, body.as_object_mut()) {
        if let Some(validation) = data.get("validation") {
            obj.insert("validation".to_string(), validation.clone());
        }
    }
    HttpResponse::json(failure.status, body)
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    const fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: Vec::new(),
        }
    }
}

fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(None);
    }

    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(path_with_query) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };
    let path = path_with_query
        .split_once('?')
        .map_or(path_with_query, |(path, _)| path);

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
        }
    }
    if content_length > MAX_BODY_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("request body of {content_length} bytes exceeds {MAX_BODY_BYTES}"),
        ));
    }

    let mut body = vec![0_u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Some(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    }))
}

fn write_http_response(stream: &mut TcpStream, response: &HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

const fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Decodes `%XX` escapes in a path segment. `None` on a malformed escape or
/// when the decoded bytes are not UTF-8.
fn percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%' {
            let hex = raw.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(b);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
