//! Shared test doubles for the behavior suites.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use gleaner_core::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Transport that replays a fixed script of responses in order.
///
/// Captures every request for assertions. When the script runs dry it
/// answers 200 with a plain page, so over-provisioning steps is harmless.
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    calls: AtomicU32,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(steps: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .expect("request log lock")
            .last()
            .cloned()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("request log lock")
            .push(request);

        let step = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::ok_html("<html>fallback</html>")));

        Box::pin(async move { step })
    }
}

/// Transport whose behavior is keyed on URL substrings, so concurrent
/// workers stay deterministic regardless of interleaving:
///
/// - `missing` in the URL → 404
/// - `timeout` in the URL → transport timeout error
/// - `blocked` in the URL → 200 with a CAPTCHA interstitial
/// - anything else → 200 with a page naming the URL
pub struct UrlPatternClient {
    calls: AtomicU32,
}

impl UrlPatternClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for UrlPatternClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = if request.url.contains("missing") {
            Ok(HttpResponse {
                status: 404,
                body: String::from("not found"),
            })
        } else if request.url.contains("timeout") {
            Err(HttpError::timed_out("request timeout: deadline elapsed"))
        } else if request.url.contains("blocked") {
            Ok(HttpResponse::ok_html(
                "<html>Please complete the CAPTCHA to continue</html>",
            ))
        } else {
            Ok(HttpResponse::ok_html(format!(
                "<html><body>listing page for {}</body></html>",
                request.url
            )))
        };

        Box::pin(async move { response })
    }
}

pub fn ok(body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::ok_html(body))
}

pub fn status(code: u16) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse {
        status: code,
        body: format!("status {code}"),
    })
}

pub fn timeout() -> Result<HttpResponse, HttpError> {
    Err(HttpError::timed_out("request timeout: deadline elapsed"))
}
