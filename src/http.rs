//! Minimal static file server used as the HTTP side of the benchmark.

use std::{
    convert::Infallible,
    future::Future,
    net::SocketAddr,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use hyper::{
    server::conn::AddrStream,
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use tracing::{debug, info};

/// Map a request path onto a file under `root`.
///
/// Returns `None` when the path is empty or escapes the root.
pub fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if depth == 0 {
        return None;
    }
    Some(resolved)
}

fn status_response(status: StatusCode) -> Response<Body> {
    let mut resp = Response::new(Body::from(status.canonical_reason().unwrap_or("")));
    *resp.status_mut() = status;
    resp
}

async fn serve_file(root: Arc<PathBuf>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let head = match *req.method() {
        Method::GET => false,
        Method::HEAD => true,
        _ => return Ok(status_response(StatusCode::METHOD_NOT_ALLOWED)),
    };
    let path = match resolve_path(&root, req.uri().path()) {
        Some(path) => path,
        None => return Ok(status_response(StatusCode::BAD_REQUEST)),
    };

    // Directories and paths through a regular file are not servable.
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            debug!("Not found: {}", path.display());
            return Ok(status_response(StatusCode::NOT_FOUND));
        }
    }

    match tokio::fs::read(&path).await {
        Ok(content) => {
            debug!("Serving {} ({} bytes)", path.display(), content.len());
            let len = content.len();
            let body = if head { Body::empty() } else { Body::from(content) };
            let resp = Response::builder()
                .header(hyper::header::CONTENT_LENGTH, len)
                .header(hyper::header::CONTENT_TYPE, "application/octet-stream")
                .body(body)
                .unwrap_or_else(|_| status_response(StatusCode::INTERNAL_SERVER_ERROR));
            Ok(resp)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("Not found: {}", path.display());
            Ok(status_response(StatusCode::NOT_FOUND))
        }
        Err(err) => {
            debug!("Failed to read {}: {:?}", path.display(), err);
            Ok(status_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Bind a static file server for `root` on `addr`.
///
/// Returns the bound address and the server future, which runs until dropped.
pub fn bind_static(
    root: PathBuf,
    addr: SocketAddr,
) -> Result<(SocketAddr, impl Future<Output = Result<(), hyper::Error>>), hyper::Error> {
    let root = Arc::new(root);
    let make_svc = make_service_fn(move |_conn: &AddrStream| {
        let root = root.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| serve_file(root.clone(), req)))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    info!("Listening on http://{}", local_addr);
    Ok((local_addr, server))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv");
        assert_eq!(
            resolve_path(root, "/data.parquet"),
            Some(PathBuf::from("/srv/data.parquet"))
        );
        assert_eq!(
            resolve_path(root, "/a/./b.parquet"),
            Some(PathBuf::from("/srv/a/b.parquet"))
        );
        assert_eq!(resolve_path(root, "/"), None);
        assert_eq!(resolve_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_path(root, "/a/../../b"), None);
    }

    #[tokio::test]
    async fn test_serve_file_statuses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
        let root = Arc::new(dir.path().to_path_buf());

        let req = Request::get("/hello.txt").body(Body::empty()).unwrap();
        let resp = serve_file(root.clone(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"hello");

        let req = Request::head("/hello.txt").body(Body::empty()).unwrap();
        let resp = serve_file(root.clone(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[hyper::header::CONTENT_LENGTH], "5");

        let req = Request::get("/missing.txt").body(Body::empty()).unwrap();
        let resp = serve_file(root.clone(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = Request::get("/../hello.txt").body(Body::empty()).unwrap();
        let resp = serve_file(root.clone(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = Request::post("/hello.txt").body(Body::empty()).unwrap();
        let resp = serve_file(root, req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_serve_file_non_file_paths_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
        let root = Arc::new(dir.path().to_path_buf());

        for path in ["/sub", "/sub/", "/hello.txt/extra"] {
            let req = Request::get(path).body(Body::empty()).unwrap();
            let resp = serve_file(root.clone(), req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", path);

            let req = Request::head(path).body(Body::empty()).unwrap();
            let resp = serve_file(root.clone(), req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", path);
        }
    }
}
