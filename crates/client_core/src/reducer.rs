//! Pure state transitions for the client. The async [`crate::controller`]
//! feeds actions in and turns the returned effects into events and timers.

use std::time::Duration;

use shared::domain::ServiceKind;
use tracing::{debug, info};

use crate::{
    alert::{Alert, AlertId, AlertPolicy},
    error::ValidationError,
    state::{AppState, AuthFlowProgress, AuthView, DashboardView, FormKey, Session, ViewState},
};

/// View/session change applied when a remote call succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Navigate(ViewState),
    ResetEmailAccepted { email: String },
    OtpAccepted,
    PasswordReset,
    SignedIn {
        display_name: String,
        token: Option<String>,
    },
    ProfileUpdated { display_name: String },
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Succeeded { message: String, next: Transition },
    Failed { message: String },
}

/// What a settle that arrives after the user moved on does with its alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LateResponse {
    /// Alert and transition are both dropped.
    #[default]
    Drop,
    /// The alert is still shown; only the transition is dropped.
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// User-initiated navigation.
    NavigateTo(ViewState),
    LoggedIn {
        display_name: String,
        token: Option<String>,
    },
    LoggedOut,
    ShowAlert(Alert),
    DismissAlert,
    ExpireAlert(AlertId),
    BeginSubmit(FormKey),
    /// Intermediate result of a chained operation; the form stays loading.
    Progress {
        form: FormKey,
        epoch: u64,
        completion: Completion,
    },
    Settle {
        form: FormKey,
        submission: u64,
        epoch: u64,
        completion: Completion,
        late: LateResponse,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ViewChanged(ViewState),
    SessionChanged { display_name: Option<String> },
    AlertChanged(Option<Alert>),
    ScheduleAlertExpiry { id: AlertId, after: Duration },
    LoadingChanged { form: FormKey, is_loading: bool },
    SubmitStarted {
        form: FormKey,
        submission: u64,
        epoch: u64,
    },
    SubmitBlocked { form: FormKey },
    /// A modal alert is showing and the action was refused.
    AwaitingDismissal,
    Suppressed { form: FormKey },
}

pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    let mut effects = Vec::new();
    match action {
        Action::NavigateTo(_)
        | Action::LoggedIn { .. }
        | Action::LoggedOut
        | Action::BeginSubmit(_)
            if state.awaiting_dismissal() =>
        {
            debug!(?action, "held until the alert is dismissed");
            effects.push(Effect::AwaitingDismissal);
        }
        Action::NavigateTo(target) => navigate(state, target, &mut effects),
        Action::LoggedIn {
            display_name,
            token,
        } => sign_in(state, display_name, token, &mut effects),
        Action::LoggedOut => sign_out(state, &mut effects),
        Action::ShowAlert(alert) => show_alert(state, alert, &mut effects),
        Action::DismissAlert => {
            if state.alerts.clear() {
                effects.push(Effect::AlertChanged(None));
            }
        }
        Action::ExpireAlert(id) => {
            if state.alerts.expire(id) {
                effects.push(Effect::AlertChanged(None));
            }
        }
        Action::BeginSubmit(form) => {
            if state.loading.contains_key(&form) {
                effects.push(Effect::SubmitBlocked { form });
            } else {
                state.last_submission += 1;
                let submission = state.last_submission;
                state.loading.insert(form, submission);
                effects.push(Effect::LoadingChanged {
                    form,
                    is_loading: true,
                });
                effects.push(Effect::SubmitStarted {
                    form,
                    submission,
                    epoch: state.epoch,
                });
            }
        }
        Action::Progress {
            form,
            epoch,
            completion,
        } => {
            if epoch == state.epoch {
                apply(state, completion, &mut effects);
            } else {
                debug!(?form, started = epoch, current = state.epoch, "dropping stale update");
            }
        }
        Action::Settle {
            form,
            submission,
            epoch,
            completion,
            late,
        } => settle(state, form, submission, epoch, completion, late, &mut effects),
    }
    effects
}

fn navigate(state: &mut AppState, target: ViewState, effects: &mut Vec<Effect>) {
    // Feedback lives on the overview rather than in its own form view.
    let target = match target {
        ViewState::Dashboard(DashboardView::ServiceForm(ServiceKind::Feedback)) => {
            ViewState::OVERVIEW
        }
        other => other,
    };

    if target.is_dashboard() && !state.session.is_authenticated {
        debug!(?target, "dashboard navigation without a session");
        change_view(state, ViewState::LOGIN, true, effects);
        show_alert(
            state,
            Alert::failure(ValidationError::SignInRequired.to_string()),
            effects,
        );
        return;
    }

    match target {
        ViewState::Auth(AuthView::OtpVerify)
            if !matches!(state.reset_flow, AuthFlowProgress::Otp { .. }) =>
        {
            debug!("otp step refused before an otp was requested");
            return;
        }
        ViewState::Auth(AuthView::ResetPassword)
            if !matches!(state.reset_flow, AuthFlowProgress::NewPassword { .. }) =>
        {
            debug!("new-password step refused before otp verification");
            return;
        }
        ViewState::Auth(AuthView::OtpVerify) | ViewState::Auth(AuthView::ResetPassword) => {}
        _ => state.reset_flow = AuthFlowProgress::Email,
    }

    change_view(state, target, true, effects);
}

fn change_view(state: &mut AppState, target: ViewState, user: bool, effects: &mut Vec<Effect>) {
    if state.view == target {
        return;
    }
    state.view = target;
    if user {
        state.epoch += 1;
    }
    effects.push(Effect::ViewChanged(target));
}

fn sign_in(
    state: &mut AppState,
    display_name: String,
    token: Option<String>,
    effects: &mut Vec<Effect>,
) {
    info!(display_name = %display_name, has_token = token.is_some(), "session started");
    state.session = Session::signed_in(display_name, token);
    state.reset_flow = AuthFlowProgress::Email;
    state.epoch += 1;
    effects.push(Effect::SessionChanged {
        display_name: state.session.display_name.clone(),
    });
    change_view(state, ViewState::OVERVIEW, false, effects);
}

fn sign_out(state: &mut AppState, effects: &mut Vec<Effect>) {
    info!("session cleared");
    state.session = Session::default();
    state.reset_flow = AuthFlowProgress::Email;
    state.epoch += 1;
    let mut cleared: Vec<FormKey> = state.loading.drain().map(|(form, _)| form).collect();
    cleared.sort_by_key(|form| format!("{form:?}"));
    for form in cleared {
        effects.push(Effect::LoadingChanged {
            form,
            is_loading: false,
        });
    }
    effects.push(Effect::SessionChanged { display_name: None });
    change_view(state, ViewState::Home, false, effects);
}

fn show_alert(state: &mut AppState, alert: Alert, effects: &mut Vec<Effect>) {
    let id = state.alerts.show(alert.clone());
    effects.push(Effect::AlertChanged(Some(alert)));
    if let AlertPolicy::Toast { after } = state.alert_policy {
        effects.push(Effect::ScheduleAlertExpiry { id, after });
    }
}

fn settle(
    state: &mut AppState,
    form: FormKey,
    submission: u64,
    epoch: u64,
    completion: Completion,
    late: LateResponse,
    effects: &mut Vec<Effect>,
) {
    // A newer submission may own the flag after a session change.
    if state.loading.get(&form) == Some(&submission) {
        state.loading.remove(&form);
        effects.push(Effect::LoadingChanged {
            form,
            is_loading: false,
        });
    }

    if epoch == state.epoch {
        apply(state, completion, effects);
        return;
    }
    match late {
        LateResponse::Drop => {
            debug!(?form, started = epoch, current = state.epoch, "dropping stale response");
            effects.push(Effect::Suppressed { form });
        }
        LateResponse::Report => {
            debug!(
                ?form,
                started = epoch,
                current = state.epoch,
                "late response shown without its transition"
            );
            let alert = match completion {
                Completion::Failed { message } => Alert::failure(message),
                Completion::Succeeded { message, .. } => Alert::success(message),
            };
            show_alert(state, alert, effects);
        }
    }
}

fn apply(state: &mut AppState, completion: Completion, effects: &mut Vec<Effect>) {
    match completion {
        Completion::Failed { message } => show_alert(state, Alert::failure(message), effects),
        Completion::Succeeded { message, next } => {
            apply_transition(state, next, effects);
            show_alert(state, Alert::success(message), effects);
        }
    }
}

fn apply_transition(state: &mut AppState, next: Transition, effects: &mut Vec<Effect>) {
    match next {
        Transition::Stay => {}
        Transition::Navigate(target) => change_view(state, target, false, effects),
        Transition::ResetEmailAccepted { email } => {
            state.reset_flow = AuthFlowProgress::Otp { email };
            change_view(state, ViewState::Auth(AuthView::OtpVerify), false, effects);
        }
        Transition::OtpAccepted => {
            if let AuthFlowProgress::Otp { email } = std::mem::take(&mut state.reset_flow) {
                state.reset_flow = AuthFlowProgress::NewPassword { email };
                change_view(state, ViewState::Auth(AuthView::ResetPassword), false, effects);
            }
        }
        Transition::PasswordReset => {
            state.reset_flow = AuthFlowProgress::Email;
            change_view(state, ViewState::LOGIN, false, effects);
        }
        Transition::SignedIn {
            display_name,
            token,
        } => sign_in(state, display_name, token, effects),
        Transition::ProfileUpdated { display_name } => {
            state.session.display_name = Some(display_name);
            effects.push(Effect::SessionChanged {
                display_name: state.session.display_name.clone(),
            });
            change_view(state, ViewState::OVERVIEW, false, effects);
        }
        Transition::SignedOut => sign_out(state, effects),
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
