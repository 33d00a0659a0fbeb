mod commands;
mod ui;

use std::{future::Future, io::Write as _, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, AlertPolicy, AuthView, Controller, DashboardView, FormFields, FormKey,
    HttpBillingApi, SubmitOutcome, ViewState,
};
use shared::domain::{ProfileAction, ServiceKind};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{
        broadcast::{self, error::TryRecvError},
        mpsc,
    },
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{Command, HELP},
    ui::Drafts,
};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the bill payment service")]
struct Args {
    /// Overrides the backend base URL from settings and environment.
    #[arg(long)]
    backend_url: Option<String>,
    /// Settings file; defaults to ./client.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep alerts on screen until dismissed.
    #[arg(long)]
    modal_alerts: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(backend_url) = args.backend_url {
        settings.backend_url = backend_url;
    }
    let alert_policy = if args.modal_alerts {
        AlertPolicy::Modal
    } else {
        settings.alert_policy()
    };
    let api = HttpBillingApi::from_settings(&settings)
        .with_context(|| format!("invalid backend url '{}'", settings.backend_url))?;
    info!(backend = %settings.backend_url, ?alert_policy, "terminal client starting");

    let (finished_tx, finished_rx) = mpsc::unbounded_channel();
    let app = App {
        controller: Controller::new(Arc::new(api), alert_policy),
        drafts: Drafts::new(),
        finished: finished_tx,
    };
    app.run(finished_rx).await
}

struct App {
    controller: Arc<Controller>,
    drafts: Drafts,
    finished: mpsc::UnboundedSender<(FormKey, SubmitOutcome)>,
}

impl App {
    async fn run(
        mut self,
        mut finished: mpsc::UnboundedReceiver<(FormKey, SubmitOutcome)>,
    ) -> Result<()> {
        let mut events = self.controller.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.redraw().await;

        loop {
            let redraw = tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read from stdin")? else {
                        break;
                    };
                    match commands::parse(&line) {
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(command)) => self.execute(command).await,
                        Ok(None) => false,
                        Err(err) => {
                            println!("{err}");
                            false
                        }
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        debug!(?event, "controller event");
                        true
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "controller events dropped");
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some((form, outcome)) = finished.recv() => self.on_finished(form, outcome),
            };

            if redraw {
                // Coalesce whatever else is already queued into one redraw.
                loop {
                    match events.try_recv() {
                        Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    }
                }
                self.redraw().await;
            } else {
                prompt();
            }
        }

        info!("terminal client exiting");
        Ok(())
    }

    /// Returns whether the screen needs redrawing without waiting for an event.
    async fn execute(&mut self, command: Command) -> bool {
        let controller = self.controller.clone();
        if !command.passes_modal_alert() && controller.snapshot().await.awaiting_dismissal() {
            println!("type 'dismiss' to close the alert first");
            return false;
        }
        match command {
            Command::Home => controller.navigate_to(ViewState::Home).await,
            Command::SignIn | Command::Cancel => controller.navigate_to(ViewState::LOGIN).await,
            Command::SignUp => {
                controller
                    .navigate_to(ViewState::Auth(AuthView::Register))
                    .await
            }
            Command::Forgot => {
                controller
                    .navigate_to(ViewState::Auth(AuthView::ForgotPassword))
                    .await
            }
            Command::Open(kind) => {
                controller
                    .navigate_to(ViewState::Dashboard(DashboardView::ServiceForm(kind)))
                    .await
            }
            Command::Close => controller.navigate_to(ViewState::OVERVIEW).await,
            Command::Profile(action) => {
                controller
                    .navigate_to(ViewState::Dashboard(DashboardView::ProfileAction(action)))
                    .await
            }
            Command::Login { email, password } => {
                self.spawn(FormKey::Login, move |controller| async move {
                    controller.submit_login(&email, &password).await
                })
            }
            Command::Register(registration) => {
                self.spawn(FormKey::Register, move |controller| async move {
                    controller.submit_register(&registration).await
                })
            }
            Command::RequestOtp { email } => {
                self.spawn(FormKey::ForgotPassword, move |controller| async move {
                    controller.request_password_reset(&email).await
                })
            }
            Command::Otp { code } => self.spawn(FormKey::OtpVerify, move |controller| async move {
                controller.verify_otp(&code).await
            }),
            Command::Reset {
                new_password,
                confirm_password,
            } => self.spawn(FormKey::ResetPassword, move |controller| async move {
                controller
                    .reset_password(&new_password, &confirm_password)
                    .await
            }),
            Command::Set(pairs) => return self.set_fields(pairs).await,
            Command::Submit => self.submit_draft().await,
            Command::Feedback(text) => {
                let fields = FormFields::new().with("message", &text);
                self.submit_service(ServiceKind::Feedback, fields);
            }
            Command::EditProfile(update) => {
                self.spawn(
                    FormKey::Profile(ProfileAction::EditProfile),
                    move |controller| async move { controller.update_profile(&update).await },
                )
            }
            Command::ChangePassword {
                current_password,
                new_password,
                confirm_password,
            } => self.spawn(
                FormKey::Profile(ProfileAction::ChangePassword),
                move |controller| async move {
                    controller
                        .change_password(&current_password, &new_password, &confirm_password)
                        .await
                },
            ),
            Command::Confirm => match controller.snapshot().await.view() {
                ViewState::Dashboard(DashboardView::ProfileAction(
                    ProfileAction::ConfirmLogout,
                )) => controller.logout().await,
                ViewState::Dashboard(DashboardView::ProfileAction(
                    ProfileAction::DeleteAccount,
                )) => self.spawn(
                    FormKey::Profile(ProfileAction::DeleteAccount),
                    |controller| async move { controller.delete_account().await },
                ),
                _ => {
                    println!("nothing to confirm here");
                    return false;
                }
            },
            Command::Logout => controller.logout().await,
            Command::Dismiss => controller.dismiss_alert().await,
            Command::Help => {
                println!("{HELP}");
                return false;
            }
            Command::Quit => return false,
        }
        // Controller events trigger the redraw for everything above.
        false
    }

    /// Service form whose draft `set` and `submit` work on.
    async fn active_form(&self) -> Option<ServiceKind> {
        match self.controller.snapshot().await.view() {
            ViewState::Dashboard(DashboardView::ServiceForm(kind)) => Some(kind),
            ViewState::Dashboard(DashboardView::Overview) => Some(ServiceKind::Feedback),
            _ => None,
        }
    }

    async fn set_fields(&mut self, pairs: Vec<(String, String)>) -> bool {
        let Some(kind) = self.active_form().await else {
            println!("open a service form first");
            return false;
        };
        let form = self.controller.table().form(kind);
        let draft = self.drafts.entry(kind).or_default();
        for (key, value) in pairs {
            if form.fields.iter().any(|field| field.key == key) {
                draft.set(&key, &value);
            } else {
                let known: Vec<&str> = form.fields.iter().map(|field| field.key).collect();
                println!("unknown field '{key}' (expected one of: {})", known.join(", "));
            }
        }
        true
    }

    async fn submit_draft(&mut self) {
        let Some(kind) = self.active_form().await else {
            println!("open a service form first");
            return;
        };
        let fields = self.drafts.get(&kind).cloned().unwrap_or_default();
        self.submit_service(kind, fields);
    }

    fn submit_service(&self, kind: ServiceKind, fields: FormFields) {
        self.spawn(FormKey::Service(kind), move |controller| async move {
            controller.submit_service(kind, &fields).await
        });
    }

    /// Runs a submission in the background so the prompt stays usable.
    fn spawn<F, Fut>(&self, form: FormKey, submit: F)
    where
        F: FnOnce(Arc<Controller>) -> Fut,
        Fut: Future<Output = SubmitOutcome> + Send + 'static,
    {
        let pending = submit(self.controller.clone());
        let finished = self.finished.clone();
        tokio::spawn(async move {
            let outcome = pending.await;
            let _ = finished.send((form, outcome));
        });
    }

    fn on_finished(&mut self, form: FormKey, outcome: SubmitOutcome) -> bool {
        debug!(?form, ?outcome, "submission finished");
        match (form, outcome) {
            (FormKey::Service(kind), SubmitOutcome::Completed) => {
                if let Some(draft) = self.drafts.get_mut(&kind) {
                    draft.clear();
                }
                true
            }
            (_, SubmitOutcome::AlreadyPending) => {
                println!("still waiting on the previous request for this form");
                false
            }
            _ => false,
        }
    }

    async fn redraw(&self) {
        let state = self.controller.snapshot().await;
        let table = self.controller.table();
        let screen = ui::guarded(|| ui::render(&state, table, &self.drafts));
        println!("\n{screen}");
        prompt();
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
