use std::fs;
use std::io::Cursor;
use std::net::ToSocketAddrs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Response, Server};

use crate::cli::ServeArgs;
use penmark::build::OUTPUT_DIR;
use penmark::config::{CONFIG_FILE, Config, missing_output_hint};

use super::resolve_project_root;

const JSON_CACHE: &str = "public, max-age=0, must-revalidate";
const IMAGE_CACHE: &str = "public, max-age=31536000, immutable";
const NO_STORE: &str = "no-store, max-age=0";

pub fn run_serve_command(args: ServeArgs) -> Result<()> {
    let root = resolve_project_root(args.root.as_deref())?;
    let config = Config::load(root.join(CONFIG_FILE))?;
    let output_root = root.join(OUTPUT_DIR);
    if !output_root.is_dir() {
        bail!(
            "{} does not exist; {}",
            output_root.display(),
            missing_output_hint(&root)
        );
    }
    let rules = HeaderRules::from_config(&config);

    let address = format!("{}:{}", args.host, args.port);
    let listener_addr = address
        .to_socket_addrs()
        .context("invalid host/port combination")?
        .next()
        .context("failed to resolve server address")?;
    println!(
        "penmark serving {} at http://{}:{}",
        output_root.display(),
        listener_addr.ip(),
        listener_addr.port()
    );

    let server = Server::http(listener_addr)
        .map_err(|err| anyhow::anyhow!("failed to start HTTP server: {err}"))?;

    for request in server.incoming_requests() {
        let url = request.url().to_string();
        let path = url.split('?').next().unwrap_or("");
        let response = serve_path(&output_root, path, &rules);
        if args.verbose {
            println!(
                "[penmark::serve] {} {} -> {}",
                request.method(),
                url,
                response.status_code().0
            );
        }
        if let Err(err) = request.respond(response) {
            eprintln!("[penmark::serve] respond error: {err}");
        }
    }

    Ok(())
}

/// Maps output paths to the caching headers they are deployed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderRules {
    json_assets: Vec<String>,
    image_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseHeaders {
    pub(crate) content_type: String,
    pub(crate) cache_control: &'static str,
}

impl HeaderRules {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            json_assets: vec![
                trim_slashes(&config.search.asset_path),
                trim_slashes(&config.stats.asset_path),
            ],
            image_dir: trim_slashes(&config.og.output_dir),
        }
    }

    /// `relative` is a `/`-separated path below the output root.
    pub(crate) fn headers_for(&self, relative: &str) -> ResponseHeaders {
        if self.json_assets.iter().any(|asset| asset == relative) {
            return ResponseHeaders {
                content_type: "application/json; charset=utf-8".to_string(),
                cache_control: JSON_CACHE,
            };
        }
        let in_image_dir = relative
            .strip_prefix(self.image_dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'));
        if in_image_dir && relative.to_ascii_lowercase().ends_with(".png") {
            return ResponseHeaders {
                content_type: "image/png".to_string(),
                cache_control: IMAGE_CACHE,
            };
        }
        let mime = mime_guess::from_path(relative).first_or_octet_stream();
        let content_type = if mime.type_() == mime_guess::mime::TEXT {
            format!("{}; charset=utf-8", mime.essence_str())
        } else {
            mime.essence_str().to_string()
        };
        ResponseHeaders {
            content_type,
            cache_control: NO_STORE,
        }
    }
}

fn trim_slashes(value: &str) -> String {
    value.trim_matches('/').to_string()
}

fn serve_path(output_root: &Path, raw_path: &str, rules: &HeaderRules) -> Response<Cursor<Vec<u8>>> {
    match resolve_path(output_root, raw_path) {
        Ok(resolved) => {
            if !resolved.is_file() {
                return not_found();
            }
            match fs::read(&resolved) {
                Ok(bytes) => {
                    let relative = relative_key(output_root, &resolved);
                    let headers = rules.headers_for(&relative);
                    let mut response = Response::from_data(bytes);
                    add_header(&mut response, "Content-Type", &headers.content_type);
                    add_header(&mut response, "Cache-Control", headers.cache_control);
                    response
                }
                Err(err) => internal_error(err.to_string()),
            }
        }
        Err(err) => {
            eprintln!("[penmark::serve] path resolution error: {err}");
            forbidden()
        }
    }
}

fn resolve_path(output_root: &Path, raw_path: &str) -> Result<PathBuf> {
    let path = raw_path.strip_prefix('/').unwrap_or(raw_path);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .context("failed to decode URL path")?;
    let mut safe = PathBuf::new();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(part) => safe.push(part),
            Component::CurDir => {}
            _ => bail!("invalid path component in {raw_path}"),
        }
    }
    let candidate = output_root.join(&safe);
    if candidate.is_dir() {
        Ok(candidate.join("index.html"))
    } else {
        Ok(candidate)
    }
}

fn relative_key(output_root: &Path, resolved: &Path) -> String {
    resolved
        .strip_prefix(output_root)
        .unwrap_or(resolved)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    Response::from_string("Not Found").with_status_code(404)
}

fn forbidden() -> Response<Cursor<Vec<u8>>> {
    Response::from_string("Forbidden").with_status_code(403)
}

fn internal_error(message: String) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(message).with_status_code(500)
}

fn add_header(response: &mut Response<Cursor<Vec<u8>>>, key: &str, value: &str) {
    if let Ok(header) = Header::from_bytes(key.as_bytes(), value.as_bytes()) {
        response.add_header(header);
    }
}
