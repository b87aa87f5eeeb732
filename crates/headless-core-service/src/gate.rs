//! Denies public access to backend-rendered pages by redirecting browsers to
//! the frontend. API, admin and asset traffic passes through untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderValue, Request, Response, StatusCode, Uri, header};
use http_body::Body;
use pin_project::pin_project;
use tower::{Layer, Service};
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use crate::config::SiteUrls;
use crate::rewrite::contains_ignore_case;
use crate::validation::BaseUrl;

pub const REDIRECT_BY_HEADER: &str = "x-redirect-by";
pub const REDIRECT_BY: &str = "headless-core";

const REST_PREFIXES: [&str; 2] = ["/wp-json", "/api"];
const ADMIN_PREFIX: &str = "/wp-admin";
const GRAPHQL_PREFIX: &str = "/graphql";
const CRON_PATH: &str = "/wp-cron.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    Malformed,
    Cron,
    Rest,
    Admin,
    CustomizerPreview,
    GraphQl,
    OAuth,
    Unconfigured,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(Bypass),
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub frontend: Option<BaseUrl>,
    pub site: SiteUrls,
}

impl GateConfig {
    pub fn new(frontend: Option<BaseUrl>, site: SiteUrls) -> Self {
        Self { frontend, site }
    }

    /// Decide what to do with a request for `uri`.
    pub fn evaluate(&self, uri: &Uri) -> GateDecision {
        if let Some(bypass) = self.classify(uri) {
            return GateDecision::Allow(bypass);
        }

        let Some(frontend) = &self.frontend else {
            return GateDecision::Allow(Bypass::Unconfigured);
        };

        let requested = self.requested_url(uri);
        if contains_ignore_case(&requested, &self.site.uploads_url) {
            return GateDecision::Allow(Bypass::Upload);
        }

        let home = self.site.home_url.with_trailing_slash();
        let frontend = frontend.with_trailing_slash();
        let redirect = match requested.strip_prefix(&home) {
            Some(rest) => format!("{frontend}{rest}"),
            None => format!("{frontend}{}", path_and_query(uri).trim_start_matches('/')),
        };

        GateDecision::Redirect(redirect)
    }

    fn classify(&self, uri: &Uri) -> Option<Bypass> {
        let path = uri.path();
        if !path.starts_with('/') {
            return Some(Bypass::Malformed);
        }

        let path = self.site_relative(path);
        let query: Vec<(String, String)> = uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let param = |name: &str| {
            query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if path == CRON_PATH || param("doing_wp_cron").is_some() {
            Some(Bypass::Cron)
        } else if REST_PREFIXES.iter().any(|prefix| under(path, prefix))
            || param("rest_route").is_some()
        {
            Some(Bypass::Rest)
        } else if under(path, ADMIN_PREFIX) {
            Some(Bypass::Admin)
        } else if param("customize_changeset_uuid").is_some() || param("wp_customize") == Some("on")
        {
            Some(Bypass::CustomizerPreview)
        } else if under(path, GRAPHQL_PREFIX) || param("graphql").is_some() {
            Some(Bypass::GraphQl)
        } else if param("rest_oauth1").is_some_and(|value| !value.is_empty()) {
            Some(Bypass::OAuth)
        } else {
            None
        }
    }

    /// Strip the home URL's own path so subdirectory installs classify the same way.
    fn site_relative<'a>(&self, path: &'a str) -> &'a str {
        let home_path = Url::parse(self.site.home_url.as_str())
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default();

        if home_path.is_empty() {
            return path;
        }

        match path.strip_prefix(home_path.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }

    /// The full URL the browser asked for, on the backend home origin.
    fn requested_url(&self, uri: &Uri) -> String {
        let origin = Url::parse(self.site.home_url.as_str())
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| self.site.home_url.trimmed().to_string());
        format!("{origin}{}", path_and_query(uri))
    }
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn redirect_response<B: Default>(location: &str) -> Option<Response<B>> {
    let location = HeaderValue::try_from(location).ok()?;
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .header(REDIRECT_BY_HEADER, REDIRECT_BY)
        .body(B::default())
        .ok()
}

/// Tower layer that redirects public page requests to the frontend.
#[derive(Clone)]
pub struct PublicAccessGateLayer {
    config: Arc<GateConfig>,
}

impl PublicAccessGateLayer {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for PublicAccessGateLayer {
    type Service = PublicAccessGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PublicAccessGate {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PublicAccessGate<S> {
    inner: S,
    config: Arc<GateConfig>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for PublicAccessGate<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body + Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = GateFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        match self.config.evaluate(req.uri()) {
            GateDecision::Redirect(location) => match redirect_response(&location) {
                Some(response) => {
                    debug!(uri = %req.uri(), location = %location, "Redirecting public request to frontend");
                    return GateFuture {
                        kind: GateFutureKind::Immediate(Some(Ok(response))),
                    };
                }
                None => {
                    warn!(uri = %req.uri(), location = %location, "Redirect target is not a valid header value");
                }
            },
            GateDecision::Allow(bypass) => {
                debug!(uri = %req.uri(), ?bypass, "Public access gate bypassed");
            }
        }

        GateFuture {
            kind: GateFutureKind::Inner(self.inner.call(req)),
        }
    }
}

#[pin_project]
pub struct GateFuture<F, B, E> {
    #[pin]
    kind: GateFutureKind<F, B, E>,
}

#[pin_project(project = GateFutureKindProj)]
enum GateFutureKind<F, B, E> {
    Inner(#[pin] F),
    Immediate(Option<Result<Response<B>, E>>),
}

impl<F, B, E> Future for GateFuture<F, B, E>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().kind.project() {
            GateFutureKindProj::Inner(fut) => fut.poll(cx),
            GateFutureKindProj::Immediate(response) => match response.take() {
                Some(response) => Poll::Ready(response),
                None => panic!("GateFuture polled after completion"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fixtures;
    use bytes::Bytes;
    use http_body_util::Empty;
    use tower::{ServiceBuilder, ServiceExt};

    fn gate() -> GateConfig {
        GateConfig::new(fixtures::frontend_settings().base_url, fixtures::site())
    }

    fn decide(uri: &str) -> GateDecision {
        gate().evaluate(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_root_redirects_to_frontend() {
        assert_eq!(
            decide("/"),
            GateDecision::Redirect("https://app.example/".into())
        );
    }

    #[test]
    fn test_redirect_keeps_path_and_query() {
        assert_eq!(
            decide("/blog/hello/?utm_source=x"),
            GateDecision::Redirect("https://app.example/blog/hello/?utm_source=x".into())
        );
    }

    #[test]
    fn test_uploads_are_served_by_backend() {
        assert_eq!(
            decide("/wp-content/uploads/a.png"),
            GateDecision::Allow(Bypass::Upload)
        );
    }

    #[test]
    fn test_bypass_predicates() {
        assert_eq!(decide("/wp-admin/"), GateDecision::Allow(Bypass::Admin));
        assert_eq!(
            decide("/wp-admin/post.php?post=1"),
            GateDecision::Allow(Bypass::Admin)
        );
        assert_eq!(decide("/wp-json/wp/v2/posts"), GateDecision::Allow(Bypass::Rest));
        assert_eq!(decide("/api/v1/health"), GateDecision::Allow(Bypass::Rest));
        assert_eq!(
            decide("/?rest_route=/wp/v2/posts"),
            GateDecision::Allow(Bypass::Rest)
        );
        assert_eq!(decide("/wp-cron.php"), GateDecision::Allow(Bypass::Cron));
        assert_eq!(
            decide("/?doing_wp_cron=123"),
            GateDecision::Allow(Bypass::Cron)
        );
        assert_eq!(
            decide("/?customize_changeset_uuid=abc"),
            GateDecision::Allow(Bypass::CustomizerPreview)
        );
        assert_eq!(decide("/graphql"), GateDecision::Allow(Bypass::GraphQl));
        assert_eq!(
            decide("/?rest_oauth1=request"),
            GateDecision::Allow(Bypass::OAuth)
        );
    }

    #[test]
    fn test_lookalike_prefixes_still_redirect() {
        assert!(matches!(decide("/apis"), GateDecision::Redirect(_)));
        assert!(matches!(decide("/wp-admin-tips"), GateDecision::Redirect(_)));
        assert!(matches!(decide("/?rest_oauth1="), GateDecision::Redirect(_)));
    }

    #[test]
    fn test_unconfigured_frontend_allows_everything() {
        let gate = GateConfig::new(None, fixtures::site());
        assert_eq!(
            gate.evaluate(&"/".parse::<Uri>().unwrap()),
            GateDecision::Allow(Bypass::Unconfigured)
        );
    }

    #[test]
    fn test_asterisk_form_is_malformed() {
        assert_eq!(decide("*"), GateDecision::Allow(Bypass::Malformed));
    }

    #[test]
    fn test_subdirectory_install() {
        let mut site = fixtures::site();
        site.home_url = crate::validation::validate_base_url("https://cms.example/blog/").unwrap();
        let gate = GateConfig::new(fixtures::frontend_settings().base_url, site);

        assert_eq!(
            gate.evaluate(&"/blog/wp-admin/".parse::<Uri>().unwrap()),
            GateDecision::Allow(Bypass::Admin)
        );
        assert_eq!(
            gate.evaluate(&"/blog/hello".parse::<Uri>().unwrap()),
            GateDecision::Redirect("https://app.example/hello".into())
        );
    }

    #[derive(Clone)]
    struct OkService;

    impl Service<Request<Empty<Bytes>>> for OkService {
        type Response = Response<Empty<Bytes>>;
        type Error = std::convert::Infallible;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Empty<Bytes>>) -> Self::Future {
            std::future::ready(Ok(Response::new(Empty::new())))
        }
    }

    #[tokio::test]
    async fn test_layer_redirects_without_calling_inner() {
        let service = ServiceBuilder::new()
            .layer(PublicAccessGateLayer::new(gate()))
            .service(OkService);

        let req = Request::builder().uri("/").body(Empty::new()).unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://app.example/"
        );
        assert_eq!(
            response.headers().get(REDIRECT_BY_HEADER).unwrap(),
            REDIRECT_BY
        );
    }

    #[tokio::test]
    async fn test_layer_passes_admin_requests_through() {
        let service = ServiceBuilder::new()
            .layer(PublicAccessGateLayer::new(gate()))
            .service(OkService);

        let req = Request::builder()
            .uri("/wp-admin/")
            .body(Empty::new())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
