//! The static-file router: spec §1 places URI resolution, directory
//! listing, and MIME inference out of core scope but still requires
//! them as a runnable collaborator (§4.9's `on_request`). Grounded on
//! the teacher's `http_provider.rs` traversal defense and
//! `handlers/get_handler.rs`'s GET dispatch, generalized to the nine
//! methods this server actually sees and simplified to read-only
//! serving — no upload/CGI/delete handlers survive here (see
//! DESIGN.md).

use std::fs::DirEntry;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Config;
use crate::http::request::Method;
use crate::http::response::{autoindex_html, mime_type};
use crate::http::{BodyStore, Dispatch, HttpResponse, ParsedRequest, Responder};

pub struct StaticFileRouter {
    config: Rc<Config>,
}

impl StaticFileRouter {
    pub fn new(config: Rc<Config>) -> Self {
        Self { config }
    }

    fn handle(&self, request: &ParsedRequest) -> HttpResponse {
        if !matches!(request.method, Method::Get | Method::Head) {
            return HttpResponse::new(405);
        }

        let Some(path) = resolve_path(&self.config.webroot, &request.uri) else {
            return HttpResponse::new(403);
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HttpResponse::new(404),
            Err(_) => return HttpResponse::new(403),
        };

        if metadata.is_dir() {
            let default = path.join(&self.config.default_file);
            if default.is_file() {
                return self.serve_file(&default);
            }
            if self.config.directory_listing {
                return self.serve_autoindex(&path, &request.uri);
            }
            return HttpResponse::new(403);
        }

        self.serve_file(&path)
    }

    fn serve_file(&self, path: &Path) -> HttpResponse {
        match std::fs::read(path) {
            Ok(bytes) => {
                let mime = mime_type(path, &self.config.mime_overrides);
                let mut resp = HttpResponse::new(200);
                resp.set_header("Content-Type", mime.into_owned());
                resp.set_body(bytes);
                resp
            }
            Err(_) => HttpResponse::new(500),
        }
    }

    fn serve_autoindex(&self, dir: &Path, uri: &str) -> HttpResponse {
        let entries: Vec<DirEntry> = match std::fs::read_dir(dir) {
            Ok(rd) => rd.filter_map(Result::ok).collect(),
            Err(_) => return HttpResponse::new(500),
        };
        let html = autoindex_html(uri, &entries);
        let mut resp = HttpResponse::new(200);
        resp.set_header("Content-Type", "text/html");
        resp.set_body(html);
        resp
    }
}

impl Dispatch for StaticFileRouter {
    fn on_request(&mut self, request: &ParsedRequest, _body: &mut BodyStore, responder: &mut Responder) {
        let mut response = self.handle(request);
        if request.method == Method::Head {
            response.strip_body_for_head();
        }
        if request.wants_close() {
            response.set_header("Connection", "close");
        }
        responder.send_data(&response.to_bytes());
    }
}

/// Joins `root` with a percent-decoded request URI, rejecting any path
/// that would climb above `root` — grounded on the teacher's
/// `sanitize_path`/`starts_with` check, reimplemented segment-by-segment
/// so it works before the path exists on disk (needed for 404s, not
/// just 403s).
fn resolve_path(root: &Path, uri: &str) -> Option<PathBuf> {
    let decoded = percent_decode(uri)?;
    let mut segments: Vec<&str> = Vec::new();
    for seg in decoded.split('/') {
        match seg {
            "" | "." => continue,
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    let mut result = root.to_path_buf();
    for seg in segments {
        result.push(seg);
    }
    Some(result)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
