use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Method, Request, Response, StatusCode};
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{global, KeyValue};
use tower::{Layer, Service};

/// Request counter and latency histogram, labelled by method, route and
/// status.
#[derive(Clone)]
struct RequestMetrics {
    requests: Counter<u64>,
    latency: Histogram<f64>,
}

impl RequestMetrics {
    fn new() -> Self {
        let meter = global::meter(crate::telemetry::SERVICE_NAME);
        Self {
            requests: meter
                .u64_counter("http.server.request.count")
                .with_description("Handled API requests")
                .build(),
            latency: meter
                .f64_histogram("http.server.request.duration")
                .with_unit("s")
                .build(),
        }
    }

    fn record(&self, route: RouteLabel, status: &str, started: Instant) {
        let attrs = route.attributes(status);
        self.requests.add(1, &attrs);
        self.latency.record(started.elapsed().as_secs_f64(), &attrs);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RouteLabel {
    method: String,
    route: String,
}

impl RouteLabel {
    fn new(method: &Method, path: &str) -> Self {
        Self {
            method: method.as_str().to_string(),
            route: normalize_path(path),
        }
    }

    fn attributes(self, status: &str) -> [KeyValue; 3] {
        [
            KeyValue::new("http.request.method", self.method),
            KeyValue::new("http.route", self.route),
            KeyValue::new("http.response.status_code", status.to_string()),
        ]
    }
}

/// Tower layer recording [`RequestMetrics`] for every API request.
#[derive(Clone)]
pub struct HttpMetricsLayer {
    metrics: RequestMetrics,
}

impl HttpMetricsLayer {
    pub fn new() -> Self {
        Self {
            metrics: RequestMetrics::new(),
        }
    }
}

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct HttpMetricsService<S> {
    inner: S,
    metrics: RequestMetrics,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HttpMetricsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let label = RouteLabel::new(req.method(), req.uri().path());
        let metrics = self.metrics.clone();
        let mut inner = self.inner.clone();
        let started = Instant::now();

        Box::pin(async move {
            let result = inner.call(req).await;
            let status = status_label(result.as_ref().ok().map(Response::status));
            metrics.record(label, &status, started);
            result
        })
    }
}

/// Status code as reported; a service error counts as a 500.
fn status_label(status: Option<StatusCode>) -> String {
    status
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        .as_u16()
        .to_string()
}

/// Collapse numeric path segments so that every item route reports as one
/// metric series.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
