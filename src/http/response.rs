//! Response construction and the small amount of static-serving support
//! (MIME table, autoindex HTML) spec §1 places out of core scope but
//! still requires as a collaborator. Grounded on the teacher's
//! `http/response.rs`, completed where it was left half-finished
//! (`status_text` only ever recognized one code).

use std::collections::HashMap;

pub struct HttpResponse {
    pub version: String,
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            status_text: Self::status_text(status_code).to_string(),
            status_code,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn status_text(code: u16) -> &'static str {
        match code {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            _ => "Unknown",
        }
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.status_text = Self::status_text(code).to_string();
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn set_body(&mut self, body: Vec<u8>) -> &mut Self {
        let len = body.len();
        self.body = body;
        self.set_header("Content-Length", len.to_string());
        self
    }

    /// HEAD responses carry every header a GET would, minus the body.
    pub fn strip_body_for_head(&mut self) {
        self.set_header("Content-Length", self.body.len().to_string());
        self.body.clear();
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.head_bytes();
        out.extend_from_slice(&self.body);
        out
    }

    fn head_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}\r\n", self.version, self.status_code, self.status_text).into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(to_pascal_case(name).as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

fn to_pascal_case(header: &str) -> String {
    header
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Canonical default responses (spec §6), used whenever a dispatch
/// callback is absent or a framing error has no more specific body.
pub fn canonical_response(status: u16) -> Vec<u8> {
    match status {
        400 => b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n".to_vec(),
        431 => b"HTTP/1.1 431 Request Header Fields Too Large\r\nConnection: close\r\n\r\n".to_vec(),
        500 => b"HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\n\r\n".to_vec(),
        501 => b"HTTP/1.1 501 Not Implemented\r\nContent-Length: 0\r\n\r\n".to_vec(),
        _ => unreachable!("canonical_response called with a status spec §6 doesn't define"),
    }
}

/// Extension-keyed MIME lookup (grounded on the teacher's
/// `get_mime_type`), with room for the config's `mime_overrides` to
/// take precedence.
pub fn mime_type(path: &std::path::Path, overrides: &HashMap<String, String>) -> std::borrow::Cow<'static, str> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return std::borrow::Cow::Borrowed("application/octet-stream");
    };
    let ext = ext.to_ascii_lowercase();
    if let Some(mime) = overrides.get(&ext) {
        return std::borrow::Cow::Owned(mime.clone());
    }
    std::borrow::Cow::Borrowed(match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    })
}

/// Directory listing HTML (grounded on the teacher's
/// `generate_autoindex`), used when a directory has no default file
/// and listing is enabled.
pub fn autoindex_html(url_path: &str, entries: &[std::fs::DirEntry]) -> Vec<u8> {
    let mut html = format!(
        "<html><head><title>Index of {url_path}</title></head><body><h1>Index of {url_path}</h1><ul>"
    );
    if url_path != "/" {
        html.push_str("<li><a href=\"../\">../</a></li>");
    }
    let mut names: Vec<String> = entries
        .iter()
        .filter_map(|e| {
            let name = e.file_name().into_string().ok()?;
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            Some(if is_dir { format!("{name}/") } else { name })
        })
        .collect();
    names.sort();
    for name in names {
        html.push_str(&format!("<li><a href=\"{name}\">{name}</a></li>"));
    }
    html.push_str("</ul></body></html>");
    html.into_bytes()
}
