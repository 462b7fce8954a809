use std::path::{Path, PathBuf};

use {async_trait::async_trait, tokio::sync::watch, tracing::debug};

use crate::{
    error::{Error, Result},
    identity::{Identity, IdentityProvider},
};

fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// Identity provider backed by a hosted sign-in endpoint.
///
/// Wire shape:
/// - `POST {base}/signin` — run the interactive flow to completion,
///   responds with the identity JSON
/// - `GET {base}/signin/pending` — pick up an interactive result that
///   completed out of band; 204/404 when nothing is pending
///
/// A successful sign-in is cached as a session document on disk so a
/// restarted process resolves through state observation instead of a
/// network round-trip.
pub struct HttpIdentityProvider {
    base_url: String,
    session_path: PathBuf,
    client: &'static reqwest::Client,
    state: watch::Sender<Option<Identity>>,
}

impl HttpIdentityProvider {
    #[must_use]
    pub fn new(base_url: impl Into<String>, session_path: PathBuf) -> Self {
        let cached = load_cached_session(&session_path);
        if let Some(identity) = &cached {
            debug!(user_id = %identity.user_id, "restored cached session");
        }
        Self {
            base_url: base_url.into(),
            session_path,
            client: shared_http_client(),
            state: watch::channel(cached).0,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn remember(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.session_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.session_path, serde_json::to_vec(identity)?)?;
        self.state.send_replace(Some(identity.clone()));
        Ok(())
    }
}

fn load_cached_session(path: &Path) -> Option<Identity> {
    let raw = std::fs::read(path).ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Translate a sign-in failure into the causes a user can act on.
fn sign_in_error(status: reqwest::StatusCode, body: String) -> Error {
    match status.as_u16() {
        400 => Error::Misconfigured { message: body },
        401 | 403 => Error::UnauthorizedOrigin { message: body },
        408 | 410 => Error::Cancelled,
        code => Error::message(format!("sign-in failed HTTP {code}: {body}")),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self) -> Result<Identity> {
        let response = self.client.post(self.url("signin")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(sign_in_error(status, body));
        }
        let identity: Identity = response.json().await?;
        self.remember(&identity)?;
        Ok(identity)
    }

    async fn redirect_result(&self) -> Result<Option<Identity>> {
        let response = self.client.get(self.url("signin/pending")).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(sign_in_error(status, body));
        }
        let identity: Identity = response.json().await?;
        self.remember(&identity)?;
        Ok(Some(identity))
    }

    fn observe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    async fn sign_out(&self) -> Result<()> {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => {},
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
            Err(err) => return Err(err.into()),
        }
        self.state.send_replace(None);
        debug!("signed out");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        axum::{Router, routing::get, routing::post},
        serde_json::json,
    };

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn session_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("session.json")
    }

    #[tokio::test]
    async fn sign_in_caches_session_and_updates_state() {
        let app = Router::new().route(
            "/signin",
            post(|| async {
                axum::Json(json!({
                    "userId": "u1",
                    "displayName": "Ada",
                    "email": "ada@example.com",
                }))
            }),
        );
        let base = serve(app).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = HttpIdentityProvider::new(base, session_file(&dir));
        let identity = provider.sign_in().await.unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
        assert_eq!(provider.current(), Some(identity.clone()));

        // A second provider over the same session file restores the session.
        let restored = HttpIdentityProvider::new("http://unused", session_file(&dir));
        assert_eq!(restored.current(), Some(identity));
    }

    #[tokio::test]
    async fn unauthorized_origin_is_distinguished() {
        let app = Router::new().route(
            "/signin",
            post(|| async { (http::StatusCode::FORBIDDEN, "origin not on allow-list") }),
        );
        let base = serve(app).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = HttpIdentityProvider::new(base, session_file(&dir));
        match provider.sign_in().await.unwrap_err() {
            Error::UnauthorizedOrigin { message } => {
                assert!(message.contains("allow-list"));
            },
            other => panic!("expected unauthorized-origin, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn misconfiguration_is_distinguished() {
        let app = Router::new().route(
            "/signin",
            post(|| async { (http::StatusCode::BAD_REQUEST, "unknown client id") }),
        );
        let base = serve(app).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = HttpIdentityProvider::new(base, session_file(&dir));
        assert!(matches!(
            provider.sign_in().await.unwrap_err(),
            Error::Misconfigured { .. }
        ));
    }

    #[tokio::test]
    async fn pending_check_returns_none_when_nothing_is_pending() {
        let app = Router::new().route(
            "/signin/pending",
            get(|| async { http::StatusCode::NO_CONTENT }),
        );
        let base = serve(app).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = HttpIdentityProvider::new(base, session_file(&dir));
        assert!(provider.redirect_result().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_check_picks_up_completed_sign_in() {
        let app = Router::new().route(
            "/signin/pending",
            get(|| async { axum::Json(json!({"userId": "u2"})) }),
        );
        let base = serve(app).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = HttpIdentityProvider::new(base, session_file(&dir));
        let identity = provider.redirect_result().await.unwrap().unwrap();
        assert_eq!(identity.user_id, "u2");
        assert_eq!(provider.current(), Some(identity));
    }

    #[tokio::test]
    async fn sign_out_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            session_file(&dir),
            serde_json::to_vec(&Identity::new("u1")).unwrap(),
        )
        .unwrap();

        let provider = HttpIdentityProvider::new("http://unused", session_file(&dir));
        assert!(provider.current().is_some());

        provider.sign_out().await.unwrap();
        assert!(provider.current().is_none());
        provider.sign_out().await.unwrap();
    }
}
