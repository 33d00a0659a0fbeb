//! Text rendering of the active view.

use std::{
    collections::HashMap,
    fmt::Write as _,
    panic::{self, AssertUnwindSafe},
};

use anyhow::Result;
use client_core::{
    dispatch::{FieldKind, ServiceForm},
    AlertPolicy, AppState, AuthView, DashboardView, DispatchTable, FormFields, FormKey, ViewState,
};
use shared::{
    catalog::{mock_transaction_history, MOCK_WALLET_BALANCE},
    domain::{ProfileAction, ServiceKind},
};
use tracing::error;

pub const RENDER_FAILURE_MESSAGE: &str =
    "Something went wrong. Please try refreshing the page or contact support.";

/// Unsubmitted input per service form.
pub type Drafts = HashMap<ServiceKind, FormFields>;

/// Runs `render` and swaps any error or panic for the generic failure text.
pub fn guarded(render: impl FnOnce() -> Result<String>) -> String {
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(screen)) => screen,
        Ok(Err(err)) => {
            error!("failed to render view: {err:#}");
            RENDER_FAILURE_MESSAGE.to_string()
        }
        Err(_) => {
            error!("view renderer panicked");
            RENDER_FAILURE_MESSAGE.to_string()
        }
    }
}

pub fn render(state: &AppState, table: &DispatchTable, drafts: &Drafts) -> Result<String> {
    let mut out = String::new();
    if let Some(alert) = state.alert() {
        let marker = if alert.success { "ok" } else { "error" };
        write!(out, "[{marker}] {}", alert.message)?;
        if state.alert_policy() == AlertPolicy::Modal {
            out.push_str("  (type 'dismiss' to close)");
        }
        out.push('\n');
    }

    match state.view() {
        ViewState::Home => render_home(&mut out)?,
        ViewState::Auth(view) => render_auth(&mut out, state, view)?,
        ViewState::Dashboard(view) => {
            render_header(&mut out, state)?;
            match view {
                DashboardView::Overview => render_overview(&mut out, state, table, drafts)?,
                DashboardView::ServiceForm(kind) => {
                    render_form(&mut out, state, table.form(kind), table, drafts.get(&kind))?;
                    writeln!(out, "type 'close' to go back to the dashboard")?;
                }
                DashboardView::ProfileAction(action) => render_profile(&mut out, state, action)?,
            }
        }
    }
    Ok(out)
}

fn render_home(out: &mut String) -> Result<()> {
    writeln!(out, "Pay your bills in seconds")?;
    writeln!(
        out,
        "Buy airtime and data, pay electricity and cable TV bills, and fund your wallet."
    )?;
    let bills: Vec<&str> = ServiceKind::BILLS
        .iter()
        .map(|kind| kind.display_name())
        .collect();
    writeln!(out, "Services: {}", bills.join(" | "))?;
    writeln!(out, "type 'signin' or 'signup' to get started")?;
    Ok(())
}

fn render_auth(out: &mut String, state: &AppState, view: AuthView) -> Result<()> {
    let (form, title, usage) = match view {
        AuthView::Login => (FormKey::Login, "Sign In", "login <email> <password>"),
        AuthView::Register => (
            FormKey::Register,
            "Create Account",
            "register <email> <password> <first> <last> <phone> --agree",
        ),
        AuthView::ForgotPassword => (
            FormKey::ForgotPassword,
            "Forgot Password",
            "request-otp <email>",
        ),
        AuthView::OtpVerify => (FormKey::OtpVerify, "Verify OTP", "otp <code>"),
        AuthView::ResetPassword => (
            FormKey::ResetPassword,
            "Reset Password",
            "reset <new> <confirm>",
        ),
    };

    writeln!(out, "== {title} ==")?;
    if let Some(email) = state.reset_flow().email() {
        if matches!(view, AuthView::OtpVerify | AuthView::ResetPassword) {
            writeln!(out, "Resetting the password for {email}")?;
        }
    }
    writeln!(out, "{usage}")?;
    if state.is_loading(form) {
        writeln!(out, "Please wait...")?;
    }
    match view {
        AuthView::Login => writeln!(out, "'signup' to register, 'forgot' to reset your password")?,
        AuthView::Register => writeln!(out, "'signin' if you already have an account")?,
        _ => writeln!(out, "'cancel' to return to sign in")?,
    }
    Ok(())
}

fn render_header(out: &mut String, state: &AppState) -> Result<()> {
    let session = state.session();
    writeln!(
        out,
        "[{}] Welcome, {}",
        session.initial(),
        session.display_name.as_deref().unwrap_or("User")
    )?;
    writeln!(out, "Wallet balance: {MOCK_WALLET_BALANCE}")?;
    Ok(())
}

fn render_overview(
    out: &mut String,
    state: &AppState,
    table: &DispatchTable,
    drafts: &Drafts,
) -> Result<()> {
    let services: Vec<&str> = ServiceKind::ALL
        .iter()
        .filter(|kind| **kind != ServiceKind::Feedback)
        .map(|kind| kind.slug())
        .collect();
    writeln!(out, "Services (open <service>): {}", services.join("  "))?;

    writeln!(out, "Transaction history")?;
    writeln!(out, "  {:<4}{:<14}{:<10}Date", "ID", "Service", "Amount")?;
    for record in mock_transaction_history() {
        writeln!(
            out,
            "  {:<4}{:<14}{:<10}{}",
            record.id,
            record.service.display_name(),
            record.amount,
            record.date
        )?;
    }

    let profile: Vec<&str> = ProfileAction::ALL
        .iter()
        .map(|action| action.slug())
        .collect();
    writeln!(out, "Profile (profile <action>): {}", profile.join("  "))?;

    render_form(
        out,
        state,
        table.form(ServiceKind::Feedback),
        table,
        drafts.get(&ServiceKind::Feedback),
    )?;
    writeln!(out, "'feedback <text>' sends it directly")?;
    Ok(())
}

fn render_form(
    out: &mut String,
    state: &AppState,
    form: &ServiceForm,
    table: &DispatchTable,
    draft: Option<&FormFields>,
) -> Result<()> {
    let value = |key: &str| draft.and_then(|draft| draft.get(key)).unwrap_or("");
    writeln!(out, "== {} ==", form.title)?;
    for field in &form.fields {
        let shown = value(field.key);
        writeln!(
            out,
            "  {} ({}): {}",
            field.label,
            field.key,
            if shown.is_empty() { "-" } else { shown }
        )?;
        match &field.kind {
            FieldKind::Select(options) => writeln!(out, "    options: {}", options.join(", "))?,
            FieldKind::DataPlan => {
                let plans = table.catalog().data_plans(value("network"));
                if plans.is_empty() {
                    writeln!(out, "    choose a network first")?;
                } else {
                    for plan in plans {
                        writeln!(out, "    {}: {}", plan.plan_id, plan.description)?;
                    }
                }
            }
            FieldKind::Text | FieldKind::LongText | FieldKind::Amount | FieldKind::Phone => {}
        }
    }
    let loading = state.is_loading(FormKey::Service(form.kind));
    writeln!(out, "  [ {} ]  (set <field>=<value>, then submit)", form.submit_caption(loading))?;
    Ok(())
}

fn render_profile(out: &mut String, state: &AppState, action: ProfileAction) -> Result<()> {
    writeln!(out, "== {} ==", action.title())?;
    match action {
        ProfileAction::EditProfile => writeln!(out, "edit-profile <first> <last> <phone>")?,
        ProfileAction::ChangePassword => {
            writeln!(out, "change-password <current> <new> <confirm>")?
        }
        ProfileAction::ConfirmLogout => writeln!(out, "Are you sure you want to log out?")?,
        ProfileAction::DeleteAccount => writeln!(
            out,
            "This permanently deletes your account and cannot be undone."
        )?,
    }
    if action.needs_confirmation() {
        writeln!(out, "'confirm' to continue, 'close' to go back")?;
    } else {
        writeln!(out, "'close' to go back")?;
    }
    if state.is_loading(FormKey::Profile(action)) {
        writeln!(out, "Processing...")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/ui_tests.rs"]
mod tests;
