//! Async driver around the reducer. Every user operation goes through here:
//! inputs are validated, the form is marked loading, the backend is called
//! and the outcome is settled back into [`AppState`]. Listeners observe the
//! resulting changes on a broadcast channel.

use std::sync::Arc;

use shared::{
    domain::{ProfileAction, ServiceKind},
    protocol::{
        ChangePasswordRequest, FundWalletRequest, LoginRequest, PasswordResetRequest,
        RegisterRequest, UpdatePasswordRequest, UpdateProfileRequest, VerifyFundingRequest,
        VerifyOtpRequest,
    },
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    alert::{Alert, AlertPolicy},
    dispatch::{
        email_address, phone_number, required, DispatchTable, FormFields, ServiceForm,
        ServiceRequest, WALLET_VERIFIED_MESSAGE, WALLET_VERIFY_FAILED_MESSAGE,
    },
    error::{ClientError, ValidationError},
    reducer::{reduce, Action, Completion, Effect, LateResponse, Transition},
    state::{AppState, AuthFlowProgress, AuthView, FormKey, ViewState},
    transport::BillingApi,
};

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const REGISTER_SUCCESS_MESSAGE: &str = "Registration successful! You can now log in.";
pub const OTP_SENT_MESSAGE: &str = "An OTP has been sent to your email.";
pub const OTP_REQUEST_FAILED_MESSAGE: &str = "An error occurred. Please try again.";
pub const OTP_VERIFIED_MESSAGE: &str = "OTP verified successfully.";
pub const OTP_INVALID_MESSAGE: &str = "Invalid OTP. Please try again.";
pub const PASSWORD_RESET_MESSAGE: &str =
    "Your password has been reset successfully. You can now log in.";
pub const PASSWORD_RESET_FAILED_MESSAGE: &str = "Failed to reset password. Please try again.";
pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully.";
pub const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile. Please try again.";
pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed successfully.";
pub const PASSWORD_CHANGE_FAILED_MESSAGE: &str = "Failed to change password. Please try again.";
pub const LOGGED_OUT_MESSAGE: &str = "You have been logged out.";
pub const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted.";
pub const ACCOUNT_DELETE_FAILED_MESSAGE: &str = "Failed to delete account. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ViewChanged(ViewState),
    SessionChanged { display_name: Option<String> },
    AlertChanged(Option<Alert>),
    LoadingChanged { form: FormKey, is_loading: bool },
}

/// How a submission ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Failed,
    /// Input was refused locally; nothing was sent.
    Rejected,
    /// The same form already has a request in flight.
    AlreadyPending,
    /// The response arrived after the user moved on and was dropped.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub agreed_to_terms: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

struct Ticket {
    form: FormKey,
    submission: u64,
    epoch: u64,
    token: Option<String>,
}

pub struct Controller {
    api: Arc<dyn BillingApi>,
    table: DispatchTable,
    inner: Arc<Mutex<AppState>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl Controller {
    pub fn new(api: Arc<dyn BillingApi>, alert_policy: AlertPolicy) -> Arc<Self> {
        Self::with_table(api, alert_policy, DispatchTable::default())
    }

    pub fn with_table(
        api: Arc<dyn BillingApi>,
        alert_policy: AlertPolicy,
        table: DispatchTable,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            table,
            inner: Arc::new(Mutex::new(AppState::new(alert_policy))),
            events,
        })
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.lock().await.clone()
    }

    pub async fn navigate_to(&self, view: ViewState) {
        self.dispatch(Action::NavigateTo(view)).await;
    }

    /// Starts a session without a remote call.
    pub async fn login(&self, display_name: impl Into<String>) {
        self.dispatch(Action::LoggedIn {
            display_name: display_name.into(),
            token: None,
        })
        .await;
    }

    /// Local sign-out; the backend keeps no session to end.
    pub async fn logout(&self) {
        let effects = self.dispatch(Action::LoggedOut).await;
        if effects.contains(&Effect::AwaitingDismissal) {
            return;
        }
        self.dispatch(Action::ShowAlert(Alert::success(LOGGED_OUT_MESSAGE)))
            .await;
    }

    pub async fn show_alert(&self, message: impl Into<String>, success: bool) {
        let alert = if success {
            Alert::success(message)
        } else {
            Alert::failure(message)
        };
        self.dispatch(Action::ShowAlert(alert)).await;
    }

    pub async fn dismiss_alert(&self) {
        self.dispatch(Action::DismissAlert).await;
    }

    pub async fn submit_login(&self, email: &str, password: &str) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::Login, |_| {
                Ok(LoginRequest {
                    email: email_address(required("Email", Some(email))?)?,
                    password: secret("Password", password)?,
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.login(&request).await {
            Ok(response) => succeeded(
                LOGIN_SUCCESS_MESSAGE,
                Transition::SignedIn {
                    display_name: response.user.first_name,
                    token: response.token,
                },
            ),
            Err(err) => failed("login", &err, GENERIC_ERROR_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn submit_register(&self, registration: &Registration) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::Register, |_| register_request(registration))
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.register(&request).await {
            Ok(response) => succeeded(
                REGISTER_SUCCESS_MESSAGE,
                Transition::SignedIn {
                    display_name: response.user.first_name,
                    token: response.token,
                },
            ),
            Err(err) => failed("register", &err, GENERIC_ERROR_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn request_password_reset(&self, email: &str) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::ForgotPassword, |state| {
                if state.view() != ViewState::Auth(AuthView::ForgotPassword) {
                    return Err(ValidationError::ResetNotStarted);
                }
                Ok(PasswordResetRequest {
                    email: email_address(required("Email", Some(email))?)?,
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.request_password_reset(&request).await {
            Ok(()) => succeeded(
                OTP_SENT_MESSAGE,
                Transition::ResetEmailAccepted {
                    email: request.email,
                },
            ),
            Err(err) => failed("request-password-reset", &err, OTP_REQUEST_FAILED_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn verify_otp(&self, otp: &str) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::OtpVerify, |state| {
                let AuthFlowProgress::Otp { email } = state.reset_flow() else {
                    return Err(ValidationError::OtpNotRequested);
                };
                Ok(VerifyOtpRequest {
                    email: email.clone(),
                    otp: required("OTP", Some(otp))?.to_string(),
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.verify_otp(&request).await {
            Ok(()) => succeeded(OTP_VERIFIED_MESSAGE, Transition::OtpAccepted),
            Err(err) => failed("verify-otp", &err, OTP_INVALID_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn reset_password(
        &self,
        new_password: &str,
        confirm_password: &str,
    ) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::ResetPassword, |state| {
                let AuthFlowProgress::NewPassword { email } = state.reset_flow() else {
                    return Err(ValidationError::OtpNotVerified);
                };
                Ok(UpdatePasswordRequest {
                    email: email.clone(),
                    new_password: confirmed(new_password, confirm_password)?,
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.update_password(&request).await {
            Ok(()) => succeeded(PASSWORD_RESET_MESSAGE, Transition::PasswordReset),
            Err(err) => failed("update-password", &err, PASSWORD_RESET_FAILED_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    /// Validates `fields` against the service's table entry and sends the
    /// resulting request. Requires a session.
    pub async fn submit_service(&self, kind: ServiceKind, fields: &FormFields) -> SubmitOutcome {
        let (ticket, request) = match self
            .start(FormKey::Service(kind), |state| {
                require_session(state)?;
                self.table.validate(kind, fields)
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let entry = self.table.form(kind);
        let token = ticket.token.as_deref();
        debug!(service = kind.slug(), "dispatching service request");
        let completion = match request {
            ServiceRequest::Purchase(purchase) => match self.api.purchase(token, &purchase).await {
                Ok(()) => succeeded(
                    &entry.success_message,
                    Transition::Navigate(ViewState::OVERVIEW),
                ),
                Err(err) => failed(kind.slug(), &err, &entry.failure_message),
            },
            ServiceRequest::Feedback(feedback) => {
                match self.api.submit_feedback(token, &feedback).await {
                    Ok(()) => succeeded(&entry.success_message, Transition::Stay),
                    Err(err) => failed(kind.slug(), &err, &entry.failure_message),
                }
            }
            ServiceRequest::FundWallet(funding) => {
                return self.fund_wallet(&ticket, entry, &funding).await;
            }
        };
        self.finish(&ticket, completion).await
    }

    /// Two-step funding: the initiation result is shown right away and the
    /// form stays loading until verification settles.
    async fn fund_wallet(
        &self,
        ticket: &Ticket,
        entry: &ServiceForm,
        request: &FundWalletRequest,
    ) -> SubmitOutcome {
        let token = ticket.token.as_deref();
        let funded = match self.api.fund_wallet(token, request).await {
            Ok(funded) => funded,
            Err(err) => {
                let completion = failed("fund-wallet", &err, &entry.failure_message);
                return self.finish(ticket, completion).await;
            }
        };
        info!(transaction_id = %funded.transaction_id, "wallet funding initiated");
        self.dispatch(Action::Progress {
            form: ticket.form,
            epoch: ticket.epoch,
            completion: succeeded(
                &entry.success_message,
                Transition::Navigate(ViewState::OVERVIEW),
            ),
        })
        .await;

        let verify = VerifyFundingRequest {
            transaction_id: funded.transaction_id,
        };
        let completion = match self.api.verify_funding(token, &verify).await {
            Ok(()) => succeeded(WALLET_VERIFIED_MESSAGE, Transition::Stay),
            Err(err) => failed("verify-funding", &err, WALLET_VERIFY_FAILED_MESSAGE),
        };
        // The payment exists server-side, so its outcome is always shown.
        self.settle(ticket, completion, LateResponse::Report).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> SubmitOutcome {
        let form = FormKey::Profile(ProfileAction::EditProfile);
        let (ticket, request) = match self
            .start(form, |state| {
                require_session(state)?;
                Ok(UpdateProfileRequest {
                    first_name: required("First Name", Some(&update.first_name))?.to_string(),
                    last_name: required("Last Name", Some(&update.last_name))?.to_string(),
                    phone: phone_number(required("Phone Number", Some(&update.phone))?)?,
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self
            .api
            .update_profile(ticket.token.as_deref(), &request)
            .await
        {
            Ok(()) => succeeded(
                PROFILE_UPDATED_MESSAGE,
                Transition::ProfileUpdated {
                    display_name: request.first_name,
                },
            ),
            Err(err) => failed("update-profile", &err, PROFILE_UPDATE_FAILED_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> SubmitOutcome {
        let form = FormKey::Profile(ProfileAction::ChangePassword);
        let (ticket, request) = match self
            .start(form, |state| {
                require_session(state)?;
                Ok(ChangePasswordRequest {
                    current_password: secret("Current Password", current_password)?,
                    new_password: confirmed(new_password, confirm_password)?,
                })
            })
            .await
        {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self
            .api
            .change_password(ticket.token.as_deref(), &request)
            .await
        {
            Ok(()) => succeeded(
                PASSWORD_CHANGED_MESSAGE,
                Transition::Navigate(ViewState::OVERVIEW),
            ),
            Err(err) => failed("change-password", &err, PASSWORD_CHANGE_FAILED_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    pub async fn delete_account(&self) -> SubmitOutcome {
        let form = FormKey::Profile(ProfileAction::DeleteAccount);
        let (ticket, ()) = match self.start(form, require_session).await {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let completion = match self.api.delete_account(ticket.token.as_deref()).await {
            Ok(()) => succeeded(ACCOUNT_DELETED_MESSAGE, Transition::SignedOut),
            Err(err) => failed("delete-account", &err, ACCOUNT_DELETE_FAILED_MESSAGE),
        };
        self.finish(&ticket, completion).await
    }

    /// Marks `form` loading once `prepare` accepts the input. Validation
    /// failures surface as a failure alert and nothing is sent. Nothing
    /// starts while a modal alert waits for dismissal.
    async fn start<T>(
        &self,
        form: FormKey,
        prepare: impl FnOnce(&AppState) -> Result<T, ValidationError>,
    ) -> Result<(Ticket, T), SubmitOutcome> {
        let (effects, started) = {
            let mut state = self.inner.lock().await;
            if state.awaiting_dismissal() {
                debug!(?form, "submit held until the alert is dismissed");
                return Err(SubmitOutcome::Rejected);
            }
            if state.is_loading(form) {
                debug!(?form, "submit ignored while a request is in flight");
                return Err(SubmitOutcome::AlreadyPending);
            }
            match prepare(&*state) {
                Err(err) => {
                    debug!(?form, %err, "submit rejected");
                    let alert = Alert::failure(err.to_string());
                    let effects = reduce(&mut state, Action::ShowAlert(alert));
                    (effects, Err(SubmitOutcome::Rejected))
                }
                Ok(value) => {
                    let token = state.session().token.clone();
                    let effects = reduce(&mut state, Action::BeginSubmit(form));
                    let started = effects.iter().find_map(|effect| match effect {
                        Effect::SubmitStarted {
                            submission, epoch, ..
                        } => Some(Ticket {
                            form,
                            submission: *submission,
                            epoch: *epoch,
                            token: token.clone(),
                        }),
                        _ => None,
                    });
                    match started {
                        Some(ticket) => (effects, Ok((ticket, value))),
                        None => (effects, Err(SubmitOutcome::AlreadyPending)),
                    }
                }
            }
        };
        publish(&self.inner, &self.events, &effects);
        started
    }

    async fn finish(&self, ticket: &Ticket, completion: Completion) -> SubmitOutcome {
        self.settle(ticket, completion, LateResponse::Drop).await
    }

    async fn settle(
        &self,
        ticket: &Ticket,
        completion: Completion,
        late: LateResponse,
    ) -> SubmitOutcome {
        let was_failure = matches!(completion, Completion::Failed { .. });
        let effects = self
            .dispatch(Action::Settle {
                form: ticket.form,
                submission: ticket.submission,
                epoch: ticket.epoch,
                completion,
                late,
            })
            .await;
        if effects
            .iter()
            .any(|effect| matches!(effect, Effect::Suppressed { .. }))
        {
            SubmitOutcome::Stale
        } else if was_failure {
            SubmitOutcome::Failed
        } else {
            SubmitOutcome::Completed
        }
    }

    async fn dispatch(&self, action: Action) -> Vec<Effect> {
        let effects = {
            let mut state = self.inner.lock().await;
            reduce(&mut state, action)
        };
        publish(&self.inner, &self.events, &effects);
        effects
    }
}

/// Forwards effects to listeners and arms toast expiry timers.
fn publish(
    inner: &Arc<Mutex<AppState>>,
    events: &broadcast::Sender<ControllerEvent>,
    effects: &[Effect],
) {
    for effect in effects {
        let event = match effect {
            Effect::ViewChanged(view) => ControllerEvent::ViewChanged(*view),
            Effect::SessionChanged { display_name } => ControllerEvent::SessionChanged {
                display_name: display_name.clone(),
            },
            Effect::AlertChanged(alert) => ControllerEvent::AlertChanged(alert.clone()),
            Effect::LoadingChanged { form, is_loading } => ControllerEvent::LoadingChanged {
                form: *form,
                is_loading: *is_loading,
            },
            Effect::ScheduleAlertExpiry { id, after } => {
                let (id, after) = (*id, *after);
                let inner = Arc::clone(inner);
                let events = events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let effects = {
                        let mut state = inner.lock().await;
                        reduce(&mut state, Action::ExpireAlert(id))
                    };
                    publish(&inner, &events, &effects);
                });
                continue;
            }
            Effect::SubmitStarted { .. }
            | Effect::SubmitBlocked { .. }
            | Effect::AwaitingDismissal
            | Effect::Suppressed { .. } => continue,
        };
        // No subscribers is fine.
        let _ = events.send(event);
    }
}

fn succeeded(message: &str, next: Transition) -> Completion {
    Completion::Succeeded {
        message: message.to_string(),
        next,
    }
}

fn failed(operation: &str, err: &ClientError, fallback: &str) -> Completion {
    warn!(operation, status = ?err.status(), "request failed: {err}");
    Completion::Failed {
        message: err.alert_message(fallback),
    }
}

fn require_session(state: &AppState) -> Result<(), ValidationError> {
    if state.session().is_authenticated {
        Ok(())
    } else {
        Err(ValidationError::SignInRequired)
    }
}

/// Passwords are checked for presence but sent untrimmed.
fn secret(label: &'static str, value: &str) -> Result<String, ValidationError> {
    required(label, Some(value))?;
    Ok(value.to_string())
}

fn confirmed(new_password: &str, confirm_password: &str) -> Result<String, ValidationError> {
    let new_password = secret("New Password", new_password)?;
    secret("Confirm Password", confirm_password)?;
    if new_password != confirm_password {
        return Err(ValidationError::PasswordsDoNotMatch);
    }
    Ok(new_password)
}

fn register_request(registration: &Registration) -> Result<RegisterRequest, ValidationError> {
    let first_name = required("First Name", Some(&registration.first_name))?.to_string();
    let last_name = required("Last Name", Some(&registration.last_name))?.to_string();
    let email = email_address(required("Email", Some(&registration.email))?)?;
    let phone = phone_number(required("Phone Number", Some(&registration.phone))?)?;
    let password = secret("Password", &registration.password)?;
    if !registration.agreed_to_terms {
        return Err(ValidationError::TermsNotAccepted);
    }
    Ok(RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        phone,
    })
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
