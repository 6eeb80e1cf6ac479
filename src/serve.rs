// src/serve.rs

//! Static preview server for the built site.
//!
//! Serves the output directory as plain files over HTTP. Directory requests
//! fall back to their `index.html`.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::{Result, SiteError};
use crate::fs::FileSystem;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

/// A bound listener plus the directory it will serve.
#[derive(Debug)]
pub struct SiteServer {
    listener: TcpListener,
    dir: PathBuf,
}

impl SiteServer {
    /// Bind `host:port` for serving `dir`. Port 0 picks a free port.
    pub async fn bind(
        fs: &dyn FileSystem,
        dir: impl Into<PathBuf>,
        host: &str,
        port: u16,
    ) -> Result<Self> {
        let dir = dir.into();
        if !fs.is_dir(&dir) {
            return Err(SiteError::MissingDirectory(dir));
        }

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| bind_error(host, port, e))?;
        Ok(Self { listener, dir })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serve until `shutdown` resolves; in-flight requests are completed.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = self.local_addr()?;
        info!(dir = %self.dir.display(), %addr, "serving site");

        axum::serve(self.listener, router(&self.dir))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("server stopped");
        Ok(())
    }
}

pub fn router(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(TraceLayer::new_for_http())
}

fn bind_error(host: &str, port: u16, err: io::Error) -> SiteError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        SiteError::InvalidArgument(format!(
            "permission denied binding {host}:{port}; ports below 1024 usually need elevated privileges"
        ))
    } else {
        SiteError::IoError(err)
    }
}
