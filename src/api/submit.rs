//! Username submission endpoint

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::user::{FormErrors, UserForm};
use crate::infrastructure::csrf::{CsrfSigner, CSRF_FIELD};

use super::state::AppState;
use super::views::{render_form, FormView};

/// Body returned once the username is accepted
pub const SUCCESS_BODY: &str = "Success";

/// Raw urlencoded submission; absent fields are `None`, never a rejection
#[derive(Debug, Default, Deserialize)]
pub struct SubmitPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Token for the next render, plus a `Set-Cookie` value when the client
/// has no valid session yet
struct IssuedToken {
    token: String,
    set_cookie: Option<String>,
}

/// GET /submit
pub async fn show_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    form_page(&state, &headers, None, None)
}

/// POST /submit
pub async fn submit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<SubmitPayload>,
) -> Response {
    let mut errors = FormErrors::new();

    if let Some(signer) = &state.csrf {
        let checked = signer
            .session_from_headers(&headers)
            .and_then(|session| signer.verify(&session, payload.csrf_token.as_deref()));

        if let Err(e) = checked {
            errors.add(CSRF_FIELD, e.to_string());
        }
    }

    let form = UserForm::from_submission(payload.username.clone());
    let validated = form.validate_input();

    match validated {
        Ok(user) if errors.is_empty() => {
            info!(username_len = user.username.chars().count(), "Username accepted");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                SUCCESS_BODY,
            )
                .into_response()
        }
        result => {
            if let Err(field_errors) = result {
                errors.merge(field_errors);
            }

            debug!(error_count = errors.len(), "Submission rejected, re-rendering form");

            form_page(&state, &headers, payload.username.as_deref(), Some(&errors))
        }
    }
}

fn form_page(
    state: &AppState,
    headers: &HeaderMap,
    username: Option<&str>,
    errors: Option<&FormErrors>,
) -> Response {
    let issued = state
        .csrf
        .as_ref()
        .map(|signer| issue_token(signer, headers));

    let html = render_form(&FormView {
        username,
        csrf_token: issued.as_ref().map(|i| i.token.as_str()),
        errors,
    });

    let set_cookie = issued
        .and_then(|i| i.set_cookie)
        .map(|cookie| [(header::SET_COOKIE, cookie)]);

    (set_cookie, Html(html)).into_response()
}

/// Reuse the client's session when its cookie verifies, otherwise start one
fn issue_token(signer: &CsrfSigner, headers: &HeaderMap) -> IssuedToken {
    match signer.session_from_headers(headers) {
        Ok(session) => IssuedToken {
            token: signer.issue(&session),
            set_cookie: None,
        },
        Err(_) => {
            let session = signer.new_session();
            IssuedToken {
                token: signer.issue(&session),
                set_cookie: Some(session.set_cookie_header()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::api::router::create_router;
    use crate::config::{AppConfig, DebugMode, StartupEnv};
    use crate::domain::user::{LENGTH_MESSAGE, REQUIRED_MESSAGE};

    const SECRET: &str = "test-secret-key";

    struct Reply {
        status: StatusCode,
        content_type: String,
        set_cookie: Option<String>,
        body: String,
    }

    fn test_state(csrf_enabled: bool) -> AppState {
        let mut config = AppConfig::default();
        config.csrf.enabled = csrf_enabled;
        AppState::new(&config, &StartupEnv::new(SECRET, DebugMode::disabled())).unwrap()
    }

    fn app(state: AppState) -> Router {
        create_router(state)
    }

    /// `name=value` part of a `Set-Cookie` header
    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }

    /// Cookie and matching token for a fresh client
    fn credentials(state: &AppState) -> (String, String) {
        let signer = state.csrf.as_ref().unwrap();
        let session = signer.new_session();
        (cookie_pair(&session.set_cookie_header()), signer.issue(&session))
    }

    fn scrape_token(html: &str) -> String {
        let marker = "name=\"csrf_token\" value=\"";
        let start = html.find(marker).unwrap() + marker.len();
        let len = html[start..].find('"').unwrap();
        html[start..start + len].to_string()
    }

    fn get(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/submit");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post(body: String, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> Reply {
        let response = app.oneshot(request).await.unwrap();
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let content_type = header_str(header::CONTENT_TYPE).unwrap_or_default();
        let set_cookie = header_str(header::SET_COOKIE);
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        Reply {
            status,
            content_type,
            set_cookie,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_renders_form_and_starts_session() {
        let reply = send(app(test_state(true)), get(None)).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body.contains("<form method=\"post\" action=\"/submit\">"));
        assert!(reply.body.contains("name=\"csrf_token\""));
        assert!(!reply.body.contains("class=\"errors\""));

        let set_cookie = reply.set_cookie.unwrap();
        assert!(set_cookie.starts_with("formguard_csrf="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
    }

    #[tokio::test]
    async fn test_get_with_valid_session_keeps_cookie() {
        let state = test_state(true);
        let (cookie, _) = credentials(&state);

        let reply = send(app(state), get(Some(&cookie))).await;

        assert!(reply.set_cookie.is_none());
    }

    #[tokio::test]
    async fn test_browser_flow_get_then_post() {
        let state = test_state(true);

        let form = send(app(state.clone()), get(None)).await;
        let cookie = cookie_pair(&form.set_cookie.unwrap());
        let token = scrape_token(&form.body);

        let reply = send(
            app(state),
            post(format!("username=alice&csrf_token={token}"), Some(&cookie)),
        )
        .await;

        assert_eq!(reply.body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_token_without_cookie_is_rejected() {
        let state = test_state(true);
        let form = send(app(state.clone()), get(None)).await;
        let token = scrape_token(&form.body);

        // Replayed from other clients that never received the cookie
        for _ in 0..2 {
            let reply = send(
                app(state.clone()),
                post(format!("username=victim&csrf_token={token}"), None),
            )
            .await;

            assert_ne!(reply.body, SUCCESS_BODY);
            assert!(reply.body.contains("The CSRF token is missing."));
        }
    }

    #[tokio::test]
    async fn test_token_with_other_clients_cookie_is_rejected() {
        let state = test_state(true);
        let (_, attacker_token) = credentials(&state);
        let (victim_cookie, _) = credentials(&state);

        let reply = send(
            app(state),
            post(
                format!("username=victim&csrf_token={attacker_token}"),
                Some(&victim_cookie),
            ),
        )
        .await;

        assert_ne!(reply.body, SUCCESS_BODY);
        assert!(reply.body.contains("The CSRF token is invalid."));
    }

    #[tokio::test]
    async fn test_forged_cookie_is_rejected() {
        let state = test_state(true);
        let (_, token) = credentials(&state);

        let reply = send(
            app(state),
            post(
                format!("username=alice&csrf_token={token}"),
                Some("formguard_csrf=abc.00"),
            ),
        )
        .await;

        assert!(reply.body.contains("The CSRF token is invalid."));
        assert!(reply.set_cookie.is_some());
    }

    #[tokio::test]
    async fn test_valid_submission_returns_success() {
        for len in 3..=25 {
            let state = test_state(true);
            let (cookie, token) = credentials(&state);
            let body = format!("username={}&csrf_token={}", "u".repeat(len), token);

            let reply = send(app(state), post(body, Some(&cookie))).await;

            assert_eq!(reply.status, StatusCode::OK, "length {len}");
            assert!(reply.content_type.starts_with("text/plain"));
            assert_eq!(reply.body, SUCCESS_BODY);
        }
    }

    #[tokio::test]
    async fn test_invalid_lengths_rerender_form() {
        for len in [1, 2, 26, 30] {
            let state = test_state(true);
            let (cookie, token) = credentials(&state);
            let body = format!("username={}&csrf_token={}", "u".repeat(len), token);

            let reply = send(app(state), post(body, Some(&cookie))).await;

            assert_eq!(reply.status, StatusCode::OK);
            assert!(reply.content_type.starts_with("text/html"), "length {len}");
            assert!(reply.body.contains(LENGTH_MESSAGE));
            assert!(!reply.body.contains("The CSRF token"));
            assert!(reply.set_cookie.is_none());
        }
    }

    #[tokio::test]
    async fn test_empty_username_shows_error() {
        let state = test_state(true);
        let (cookie, token) = credentials(&state);

        let reply = send(
            app(state),
            post(format!("username=&csrf_token={token}"), Some(&cookie)),
        )
        .await;

        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body.contains("class=\"errors\""));
        assert!(reply.body.contains(REQUIRED_MESSAGE));
    }

    #[tokio::test]
    async fn test_missing_fields_are_not_rejected() {
        let reply = send(app(test_state(true)), post(String::new(), None)).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(REQUIRED_MESSAGE));
        assert!(reply.body.contains("The CSRF token is missing."));
    }

    #[tokio::test]
    async fn test_bad_csrf_token_blocks_valid_username() {
        let state = test_state(true);
        let (cookie, _) = credentials(&state);

        let reply = send(
            app(state),
            post("username=alice&csrf_token=forged.1.00".to_string(), Some(&cookie)),
        )
        .await;

        assert!(reply.body.contains("The CSRF token is invalid."));
        assert!(reply.body.contains("value=\"alice\""));
        assert_ne!(reply.body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_csrf_disabled_accepts_plain_submission() {
        let reply = send(
            app(test_state(false)),
            post("username=alice".to_string(), None),
        )
        .await;

        assert_eq!(reply.body, SUCCESS_BODY);
        assert!(reply.set_cookie.is_none());
    }

    #[tokio::test]
    async fn test_submitted_value_is_escaped() {
        let reply = send(
            app(test_state(false)),
            post("username=%3C%22".to_string(), None),
        )
        .await;

        assert!(reply.body.contains("value=\"&lt;&quot;\""));
        assert!(reply.body.contains(LENGTH_MESSAGE));
    }
}
