//! Login form submission and the login/signup box toggle.

use crate::dom::{ids, ElementId, View};
use crate::fetcher::{Backend, DataFetcher};
use std::sync::Arc;
use tracing::{error, info};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const LOGIN_ERROR: &str = "Login error";

#[derive(Debug, Clone)]
pub struct LoginBindings {
    pub login_box: ElementId,
    pub signup_box: ElementId,
    pub show_signup: Option<ElementId>,
    pub show_login: Option<ElementId>,
    pub email: ElementId,
    pub password: ElementId,
    pub submit: Option<ElementId>,
}

impl Default for LoginBindings {
    fn default() -> Self {
        Self {
            login_box: ids::LOGIN_BOX.into(),
            signup_box: ids::SIGNUP_BOX.into(),
            show_signup: Some(ids::SHOW_SIGNUP.into()),
            show_login: Some(ids::SHOW_LOGIN.into()),
            email: ids::LOGIN_EMAIL.into(),
            password: ids::LOGIN_PASSWORD.into(),
            submit: Some(ids::LOGIN_SUBMIT.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Backend redirected; the page went to this URL.
    Navigated(String),
    /// Any non-redirect answer.
    Rejected(u16),
    /// Network failure.
    Failed,
    /// Email or password input missing from the page.
    Skipped,
}

pub struct LoginController<B, V> {
    view: V,
    bindings: LoginBindings,
    fetcher: Arc<DataFetcher<B>>,
}

impl<B: Backend, V: View> LoginController<B, V> {
    pub fn new(view: V, bindings: LoginBindings, fetcher: Arc<DataFetcher<B>>) -> Self {
        Self { view, bindings, fetcher }
    }

    pub fn show_signup(&self) {
        self.view.set_visible(&self.bindings.login_box, false);
        self.view.set_visible(&self.bindings.signup_box, true);
    }

    pub fn show_login(&self) {
        self.view.set_visible(&self.bindings.signup_box, false);
        self.view.set_visible(&self.bindings.login_box, true);
    }

    /// Posts the credentials as form fields `username` / `password`.
    pub async fn submit(&self, email: &str, password: &str) -> LoginOutcome {
        let path = self.fetcher.conf().login_path.clone();
        let fields = [("username", email), ("password", password)];

        match self.fetcher.backend().post_form(&path, &fields).await {
            Ok(reply) => match reply.redirect {
                Some(target) => {
                    info!("login accepted, navigating to {target}");
                    self.view.navigate(&target);
                    LoginOutcome::Navigated(target)
                }
                None => {
                    info!("login rejected (HTTP {})", reply.status);
                    self.view.notify(INVALID_CREDENTIALS);
                    LoginOutcome::Rejected(reply.status)
                }
            },
            Err(e) => {
                error!("login request failed: {e}");
                self.view.notify(LOGIN_ERROR);
                LoginOutcome::Failed
            }
        }
    }

    /// Submits whatever the email and password inputs hold.
    pub async fn submit_from_view(&self) -> LoginOutcome {
        let email = self.view.value(&self.bindings.email);
        let password = self.view.value(&self.bindings.password);
        match (email, password) {
            (Some(email), Some(password)) => self.submit(&email, &password).await,
            _ => LoginOutcome::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConf;
    use crate::error::FetchError;
    use crate::fetcher::FormReply;
    use crate::headless::HeadlessPage;
    use parking_lot::Mutex;
    use serde_json::Value;

    struct FormBackend {
        reply: Result<FormReply, String>,
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl Backend for FormBackend {
        async fn get_json(&self, _path: &str) -> Result<Value, FetchError> {
            Err(FetchError::Network("unused".into()))
        }

        async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<FormReply, FetchError> {
            let owned = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            self.seen.lock().push((path.to_string(), owned));
            self.reply.clone().map_err(FetchError::Network)
        }
    }

    fn controller(reply: Result<FormReply, String>) -> (Arc<HeadlessPage>, Arc<FormBackend>, LoginController<Arc<FormBackend>, Arc<HeadlessPage>>) {
        let page = Arc::new(HeadlessPage::dashboard());
        let backend = Arc::new(FormBackend { reply, seen: Mutex::new(Vec::new()) });
        let fetcher = Arc::new(DataFetcher::new(backend.clone(), BackendConf::default()));
        let ctrl = LoginController::new(page.clone(), LoginBindings::default(), fetcher);
        (page, backend, ctrl)
    }

    #[tokio::test]
    async fn test_redirect_navigates() {
        let (page, backend, ctrl) = controller(Ok(FormReply {
            status: 302,
            redirect: Some("http://127.0.0.1:5000/dashboard".into()),
        }));

        let outcome = ctrl.submit("admin@gmail.com", "12345").await;
        assert_eq!(outcome, LoginOutcome::Navigated("http://127.0.0.1:5000/dashboard".into()));
        assert_eq!(page.navigations(), vec!["http://127.0.0.1:5000/dashboard"]);
        assert!(page.notices().is_empty());

        let seen = backend.seen.lock();
        assert_eq!(seen[0].0, "/login");
        assert_eq!(seen[0].1[0], ("username".to_string(), "admin@gmail.com".to_string()));
    }

    #[tokio::test]
    async fn test_non_redirect_is_invalid_credentials() {
        let (page, _, ctrl) = controller(Ok(FormReply { status: 401, redirect: None }));
        assert_eq!(ctrl.submit("a@b.c", "nope").await, LoginOutcome::Rejected(401));
        assert_eq!(page.notices(), vec!["Invalid username or password"]);
        assert!(page.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_notice() {
        let (page, _, ctrl) = controller(Err("refused".into()));
        assert_eq!(ctrl.submit("a@b.c", "x").await, LoginOutcome::Failed);
        assert_eq!(page.notices(), vec!["Login error"]);
    }

    #[tokio::test]
    async fn test_missing_inputs_skip_submission() {
        let (page, backend, ctrl) = controller(Ok(FormReply { status: 401, redirect: None }));
        page.remove(ids::LOGIN_PASSWORD);
        assert_eq!(ctrl.submit_from_view().await, LoginOutcome::Skipped);
        assert!(backend.seen.lock().is_empty());
    }

    #[test]
    fn test_toggle_boxes() {
        let (page, _, ctrl) = controller(Err("unused".into()));
        ctrl.show_signup();
        assert!(!page.is_visible(ids::LOGIN_BOX));
        assert!(page.is_visible(ids::SIGNUP_BOX));
        ctrl.show_login();
        assert!(page.is_visible(ids::LOGIN_BOX));
        assert!(!page.is_visible(ids::SIGNUP_BOX));
    }
}
