//! Where to send the user after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// A redirect target must be a path on this site and must not loop back to the log-in page.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW
}

/// Reduce `raw_url` to a same-site path and query, or `None` if it is not safe to redirect to.
///
/// Absolute URLs are only accepted from the `HX-Current-URL` header, see
/// [build_log_in_redirect_url].
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    path_and_query(&uri)
}

fn path_and_query(uri: &Uri) -> Option<String> {
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that brings the user back to the page they requested.
///
/// HTMX requests to `/api` routes are redirected back to the page that made
/// the request, read from the `HX-Current-URL` header.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        path_and_query(request.uri())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| path_and_query(&uri));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::{
        auth::redirect::{build_log_in_redirect_url, normalize_redirect_url},
        endpoints,
    };

    #[test]
    fn accepts_relative_paths_with_queries() {
        assert_eq!(
            normalize_redirect_url("/journal?page=2"),
            Some("/journal?page=2".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites_and_the_log_in_page() {
        for url in [
            "https://evil.example/journal",
            "//evil.example/journal",
            "journal",
            endpoints::LOG_IN_VIEW,
        ] {
            assert_eq!(normalize_redirect_url(url), None, "want None for {url}");
        }
    }

    #[test]
    fn page_request_redirects_back_to_itself() {
        let request = Request::get("/invoices?status=draft")
            .body(Body::empty())
            .unwrap();

        let got = build_log_in_redirect_url(&request).unwrap();

        assert_eq!(
            got,
            "/log_in?redirect_url=%2Finvoices%3Fstatus%3Ddraft".to_owned()
        );
    }

    #[test]
    fn api_request_redirects_to_current_page() {
        let request = Request::post("/api/journal")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/journal/new")
            .body(Body::empty())
            .unwrap();

        let got = build_log_in_redirect_url(&request).unwrap();

        assert_eq!(got, "/log_in?redirect_url=%2Fjournal%2Fnew".to_owned());
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::post("/api/journal").body(Body::empty()).unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}
