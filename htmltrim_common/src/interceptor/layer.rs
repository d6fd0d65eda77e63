use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use futures_util::{future::BoxFuture, stream, StreamExt};
use hyper::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use hyper::StatusCode;
use scorched::{logf, LogData, LogImportance};
use tower::{Layer, Service};

use super::switch::TrimSwitch;
use crate::rewriting::{html::WhitespaceRewriter, rewriter::Rewriter};

/// Largest response body, in bytes, that is collected for trimming by default.
pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Wraps `service` so that its HTML responses are trimmed while `switch` is on.
pub fn wrap<S>(service: S, switch: TrimSwitch) -> TrimService<S> {
    TrimLayer::new(switch).layer(service)
}

/// Installs [`TrimService`] around a service.
pub struct TrimLayer<R = WhitespaceRewriter> {
    rewriter: Arc<R>,
    switch: TrimSwitch,
    max_body: usize,
}

impl TrimLayer {
    pub fn new(switch: TrimSwitch) -> Self {
        Self::with_rewriter(Arc::new(WhitespaceRewriter::default()), switch)
    }
}

impl<R> TrimLayer<R> {
    pub fn with_rewriter(rewriter: Arc<R>, switch: TrimSwitch) -> Self {
        Self {
            rewriter,
            switch,
            max_body: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Bodies longer than `bytes` are passed through untrimmed instead of being buffered.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }
}

impl<R> Clone for TrimLayer<R> {
    fn clone(&self) -> Self {
        Self {
            rewriter: self.rewriter.clone(),
            switch: self.switch.clone(),
            max_body: self.max_body,
        }
    }
}

impl<S, R> Layer<S> for TrimLayer<R> {
    type Service = TrimService<S, R>;

    fn layer(&self, inner: S) -> Self::Service {
        TrimService {
            inner,
            rewriter: self.rewriter.clone(),
            switch: self.switch.clone(),
            max_body: self.max_body,
        }
    }
}

/// Rewrites `text/html` response bodies of the wrapped service.
///
/// A response body arrives in frames and a `<pre>` block may span several of them, so the whole
/// body is collected and rewritten as one buffer. Encoded bodies, partial content and bodies
/// over the size cap are passed through untouched.
pub struct TrimService<S, R = WhitespaceRewriter> {
    inner: S,
    rewriter: Arc<R>,
    switch: TrimSwitch,
    max_body: usize,
}

impl<S: Clone, R> Clone for TrimService<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            rewriter: self.rewriter.clone(),
            switch: self.switch.clone(),
            max_body: self.max_body,
        }
    }
}

impl<S, R> Service<Request> for TrimService<S, R>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    R: Rewriter + Send + Sync + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let rewriter = self.rewriter.clone();
        let switch = self.switch.clone();
        let max_body = self.max_body;

        Box::pin(async move {
            let res = inner.call(req).await?;

            if !switch.is_enabled() || !is_plain_html(&res) {
                return Ok(res);
            }

            Ok(trim_response(res, rewriter.as_ref(), max_body).await)
        })
    }
}

fn is_plain_html(res: &Response) -> bool {
    if res.headers().contains_key(CONTENT_ENCODING) {
        return false;
    }

    // a byte range of the page cannot be trimmed on its own
    if res.status() == StatusCode::PARTIAL_CONTENT || res.headers().contains_key(CONTENT_RANGE) {
        return false;
    }

    match res.headers().get(CONTENT_TYPE) {
        Some(content_type) => content_type.to_str().unwrap_or("").contains("text/html"),
        None => false,
    }
}

enum Collected {
    Complete(Vec<u8>),
    TooLarge(Body),
}

/// Buffers `body` unless it turns out to be longer than `limit`, in which case the frames read
/// so far are put back in front of the rest of the stream.
async fn collect(body: Body, limit: usize) -> Result<Collected, axum::Error> {
    if HttpBody::size_hint(&body).lower() > limit as u64 {
        return Ok(Collected::TooLarge(body));
    }

    let mut frames = body.into_data_stream();
    let mut chunks = Vec::new();
    let mut len = 0;

    while let Some(chunk) = frames.next().await {
        let chunk = chunk?;
        len += chunk.len();
        chunks.push(chunk);

        if len > limit {
            let seen = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>));
            return Ok(Collected::TooLarge(Body::from_stream(seen.chain(frames))));
        }
    }

    Ok(Collected::Complete(chunks.concat()))
}

async fn trim_response<R: Rewriter + ?Sized>(res: Response, rewriter: &R, limit: usize) -> Response {
    let (mut parts, body) = res.into_parts();

    let bytes = match collect(body, limit).await {
        Ok(Collected::Complete(bytes)) => bytes,
        Ok(Collected::TooLarge(body)) => {
            logf!(Warning, "Response body over {} bytes, passing it through untrimmed", limit);
            return Response::from_parts(parts, body);
        }
        Err(e) => {
            logf!(Error, "Error reading response body: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error reading response body")
                .into_response();
        }
    };

    if bytes.is_empty() {
        return Response::from_parts(parts, Body::empty());
    }

    let trimmed = rewriter.rewrite(bytes.clone());

    let (len, body) = if trimmed.is_empty() {
        (bytes.len(), Body::from(bytes))
    } else {
        (trimmed.len(), Body::from(trimmed))
    };

    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::{body::to_bytes, response::Html, routing::get, Router};
    use tower::{service_fn, ServiceExt};

    use super::*;

    const PAGE: &str = "<div>\n  <p> hi </p>\n</div>\n";

    fn app(switch: TrimSwitch) -> Router {
        Router::new()
            .route("/page", get(|| async { Html(PAGE) }))
            .route("/text", get(|| async { PAGE }))
            .route(
                "/encoded",
                get(|| async {
                    (
                        [(CONTENT_TYPE, "text/html"), (CONTENT_ENCODING, "identity")],
                        PAGE,
                    )
                }),
            )
            .route(
                "/partial",
                get(|| async {
                    (
                        StatusCode::PARTIAL_CONTENT,
                        [(CONTENT_TYPE, "text/html"), (CONTENT_RANGE, "bytes 0-26/27")],
                        PAGE,
                    )
                }),
            )
            .layer(TrimLayer::new(switch))
    }

    async fn fetch(app: Router, uri: &str) -> (Response, String) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (parts, body) = res.into_parts();
        let body = to_bytes(body, usize::MAX).await.unwrap();
        (
            Response::from_parts(parts, Body::empty()),
            String::from_utf8(body.to_vec()).unwrap(),
        )
    }

    #[tokio::test]
    async fn html_is_trimmed() {
        let (res, body) = fetch(app(TrimSwitch::default()), "/page").await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body, "<div><p>hi</p></div>");
        assert_eq!(res.headers()[CONTENT_LENGTH], "20");
    }

    #[tokio::test]
    async fn other_content_types_pass_through() {
        let (_, body) = fetch(app(TrimSwitch::default()), "/text").await;
        assert_eq!(body, PAGE);
    }

    #[tokio::test]
    async fn encoded_bodies_pass_through() {
        let (_, body) = fetch(app(TrimSwitch::default()), "/encoded").await;
        assert_eq!(body, PAGE);
    }

    #[tokio::test]
    async fn switch_is_read_per_response() {
        let switch = TrimSwitch::new(false);
        let app = app(switch.clone());

        let (_, body) = fetch(app.clone(), "/page").await;
        assert_eq!(body, PAGE);

        switch.set(true);
        let (_, body) = fetch(app, "/page").await;
        assert_eq!(body, "<div><p>hi</p></div>");
    }

    #[tokio::test]
    async fn wrap_installs_interceptor() {
        let handler = service_fn(|_: Request| async {
            Ok::<_, Infallible>(Html("<ul>\n <li> a </li>\n</ul>").into_response())
        });

        let res = wrap(handler, TrimSwitch::default())
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

        assert_eq!(&body[..], b"<ul><li>a</li></ul>");
    }

    #[tokio::test]
    async fn empty_body_stays_empty() {
        let handler = service_fn(|_: Request| async {
            Ok::<_, Infallible>(Html("").into_response())
        });

        let res = wrap(handler, TrimSwitch::default())
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn partial_content_passes_through() {
        let (res, body) = fetch(app(TrimSwitch::default()), "/partial").await;

        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body, PAGE);
    }

    #[tokio::test]
    async fn oversized_bodies_pass_through() {
        let app = Router::new()
            .route("/page", get(|| async { Html(PAGE) }))
            .layer(TrimLayer::new(TrimSwitch::default()).max_body_size(8));

        let (_, body) = fetch(app, "/page").await;
        assert_eq!(body, PAGE);
    }

    #[tokio::test]
    async fn streamed_body_over_cap_arrives_whole() {
        let handler = service_fn(|_: Request| async {
            let frames = stream::iter(vec![
                Ok::<_, Infallible>("<div>\n  <p> a </p>"),
                Ok(" \n</div>\n"),
            ]);
            Ok::<_, Infallible>(
                Response::builder()
                    .header(CONTENT_TYPE, "text/html")
                    .body(Body::from_stream(frames))
                    .unwrap(),
            )
        });

        let res = TrimLayer::new(TrimSwitch::default())
            .max_body_size(12)
            .layer(handler)
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

        assert_eq!(&body[..], b"<div>\n  <p> a </p> \n</div>\n");
    }

    #[tokio::test]
    async fn body_at_cap_is_trimmed() {
        let handler = service_fn(|_: Request| async {
            Ok::<_, Infallible>(Html(PAGE).into_response())
        });

        let res = TrimLayer::new(TrimSwitch::default())
            .max_body_size(PAGE.len())
            .layer(handler)
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

        assert_eq!(&body[..], b"<div><p>hi</p></div>");
    }
}
