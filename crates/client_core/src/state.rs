use std::collections::HashMap;

use shared::domain::{ProfileAction, ServiceKind};

use crate::alert::{Alert, AlertChannel, AlertPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthView {
    Login,
    Register,
    ForgotPassword,
    OtpVerify,
    ResetPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardView {
    Overview,
    ServiceForm(ServiceKind),
    ProfileAction(ProfileAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewState {
    #[default]
    Home,
    Auth(AuthView),
    Dashboard(DashboardView),
}

impl ViewState {
    pub const LOGIN: ViewState = ViewState::Auth(AuthView::Login);
    pub const OVERVIEW: ViewState = ViewState::Dashboard(DashboardView::Overview);

    pub fn is_dashboard(self) -> bool {
        matches!(self, ViewState::Dashboard(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    pub display_name: Option<String>,
    /// Bearer token from the auth response, when the backend issues one.
    pub token: Option<String>,
}

impl Session {
    pub fn signed_in(display_name: impl Into<String>, token: Option<String>) -> Self {
        Self {
            is_authenticated: true,
            display_name: Some(display_name.into()),
            token,
        }
    }

    pub fn initial(&self) -> char {
        self.display_name
            .as_deref()
            .and_then(|name| name.chars().next())
            .unwrap_or('U')
            .to_ascii_uppercase()
    }
}

/// Position in the password-reset sequence. Steps only move forward after
/// the previous step's remote call succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthFlowProgress {
    #[default]
    Email,
    Otp { email: String },
    NewPassword { email: String },
}

impl AuthFlowProgress {
    pub fn email(&self) -> Option<&str> {
        match self {
            AuthFlowProgress::Email => None,
            AuthFlowProgress::Otp { email } | AuthFlowProgress::NewPassword { email } => {
                Some(email.as_str())
            }
        }
    }
}

/// Identifies a form instance for loading/duplicate-submit tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKey {
    Login,
    Register,
    ForgotPassword,
    OtpVerify,
    ResetPassword,
    Service(ServiceKind),
    Profile(ProfileAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: FormKey,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub(crate) view: ViewState,
    pub(crate) session: Session,
    pub(crate) alerts: AlertChannel,
    pub(crate) alert_policy: AlertPolicy,
    pub(crate) reset_flow: AuthFlowProgress,
    /// Loading forms, each mapped to the submission that owns the flag.
    pub(crate) loading: HashMap<FormKey, u64>,
    pub(crate) last_submission: u64,
    /// Bumped on every user navigation and session change; responses that
    /// started under an older epoch are stale.
    pub(crate) epoch: u64,
}

impl AppState {
    pub fn new(alert_policy: AlertPolicy) -> Self {
        Self {
            alert_policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alerts.current()
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        self.alert_policy
    }

    pub fn reset_flow(&self) -> &AuthFlowProgress {
        &self.reset_flow
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_loading(&self, form: FormKey) -> bool {
        self.loading.contains_key(&form)
    }

    pub fn pending_operation(&self, form: FormKey) -> PendingOperation {
        PendingOperation {
            kind: form,
            is_loading: self.is_loading(form),
        }
    }

    /// A modal alert is up; only dismissing it moves the user on.
    pub fn awaiting_dismissal(&self) -> bool {
        self.alert_policy == AlertPolicy::Modal && self.alerts.current().is_some()
    }

    /// Submit controls are disabled, not hidden, while loading.
    pub fn submit_enabled(&self, form: FormKey) -> bool {
        !self.is_loading(form)
    }
}
