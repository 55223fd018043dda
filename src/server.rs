//! Cry proxy: `GET /api/cries/{id}` fetches the ogg cry upstream and streams
//! it back as mp3 through an `ffmpeg` child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::{StreamExt, stream};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// The upstream host rejects non-browser agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

const NOT_FOUND_BODY: &str = "Audio file not found";
const TRANSCODE_FAILED_BODY: &str = "Error during audio conversion";

/// Shared handler state
#[derive(Clone)]
pub struct CryProxyState {
    client: Client,
    cry_base: String,
    ffmpeg: PathBuf,
}

impl CryProxyState {
    pub fn new(
        cry_base: impl Into<String>,
        ffmpeg: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            cry_base: cry_base.into(),
            ffmpeg: ffmpeg.into(),
        })
    }

    fn cry_url(&self, id: u32) -> String {
        format!("{}/{id}.ogg", self.cry_base.trim_end_matches('/'))
    }
}

/// Proxy routes with CORS for `allowed_origin` and request tracing
pub fn router(state: CryProxyState, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| Error::Config(format!("allowed origin {allowed_origin:?}: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .route("/api/cries/{id}", get(cry))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn cry(State(state): State<CryProxyState>, UrlPath(id): UrlPath<u32>) -> Response {
    let url = state.cry_url(id);
    let upstream = match state
        .client
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(response) => response,
        Err(err) => {
            error!(id, %url, error = %err, "could not fetch cry for this species");
            return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
        }
    };

    match transcode(&state.ffmpeg, upstream).await {
        Ok(body) => ([(header::CONTENT_TYPE, "audio/mpeg")], body).into_response(),
        Err(err) => {
            error!(id, error = %err, "cry transcoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, TRANSCODE_FAILED_BODY).into_response()
        }
    }
}

/// Pipe `upstream` through `ffmpeg -f ogg -i pipe:0 -f mp3 pipe:1`.
///
/// Resolves once the encoder produced its first chunk; failures before that
/// are returned, later ones end the stream and are only logged.
pub async fn transcode(ffmpeg: &Path, upstream: reqwest::Response) -> Result<Body> {
    let mut child = Command::new(ffmpeg)
        .args(["-hide_banner", "-loglevel", "error"])
        .args(["-f", "ogg", "-i", "pipe:0", "-f", "mp3", "pipe:1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Transcode(format!("could not start {}: {e}", ffmpeg.display())))?;

    let (Some(mut stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        return Err(Error::Transcode("encoder pipes unavailable".to_string()));
    };

    let mut audio = upstream.bytes_stream();
    let feeder = tokio::spawn(async move {
        while let Some(chunk) = audio.next().await {
            stdin.write_all(&chunk?).await?;
        }
        stdin.shutdown().await?;
        Ok::<_, Error>(())
    });

    let mut output = ReaderStream::new(stdout);
    let first = match output.next().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(e)) => {
            feeder.abort();
            return Err(Error::Transcode(format!("reading encoder output: {e}")));
        }
        None => {
            feeder.abort();
            let status = child.wait().await?;
            return Err(Error::Transcode(format!("encoder produced no output ({status})")));
        }
    };
    debug!(bytes = first.len(), "encoder started streaming");

    tokio::spawn(async move {
        match feeder.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "feeding the encoder failed"),
            Err(err) => warn!(error = %err, "encoder feeder task failed"),
        }
        match child.wait().await {
            Ok(status) if status.success() => debug!("encoder finished"),
            Ok(status) => error!(%status, "encoder failed mid-stream"),
            Err(err) => error!(error = %err, "could not wait for encoder"),
        }
    });

    let chunks = stream::iter([Ok::<_, std::io::Error>(first)]).chain(output);
    Ok(Body::from_stream(chunks))
}

/// Serve the proxy on `0.0.0.0:{port}` until interrupted
pub async fn serve(state: CryProxyState, port: u16, allowed_origin: &str) -> anyhow::Result<()> {
    let app = router(state, allowed_origin)?;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, %allowed_origin, "cry proxy listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down cry proxy");
        })
        .await?;

    Ok(())
}
