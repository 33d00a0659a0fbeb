use std::{collections::HashMap, sync::Mutex as StdMutex, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::TransactionId,
    protocol::{AuthResponse, FeedbackRequest, FundWalletResponse, PurchaseRequest, UserSummary},
};
use tokio::sync::Notify;

use super::*;
use crate::{state::DashboardView, transport::ApiResult};

#[derive(Debug, Clone)]
enum Reply {
    Ok,
    Reject(u16, Option<&'static str>),
}

#[derive(Default)]
struct ScriptedApi {
    replies: HashMap<&'static str, Reply>,
    calls: StdMutex<Vec<(&'static str, Option<String>)>>,
    gates: Vec<Arc<Notify>>,
}

impl ScriptedApi {
    fn reply(mut self, operation: &'static str, reply: Reply) -> Self {
        self.replies.insert(operation, reply);
        self
    }

    /// The first `count` calls each wait for `notify_one` on their own gate.
    fn held(mut self, count: usize) -> (Self, Vec<Arc<Notify>>) {
        self.gates = (0..count).map(|_| Arc::new(Notify::new())).collect();
        let gates = self.gates.clone();
        (self, gates)
    }

    fn calls(&self) -> Vec<(&'static str, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn operations(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }

    async fn answer(&self, operation: &'static str, token: Option<&str>) -> ApiResult<()> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((operation, token.map(str::to_string)));
            calls.len() - 1
        };
        if let Some(gate) = self.gates.get(index) {
            gate.notified().await;
        }
        match self.replies.get(operation).cloned().unwrap_or(Reply::Ok) {
            Reply::Ok => Ok(()),
            Reply::Reject(status, message) => Err(ClientError::Api {
                status,
                message: message.map(str::to_string),
            }),
        }
    }
}

fn signed_in_as(name: &str) -> AuthResponse {
    AuthResponse {
        user: UserSummary {
            first_name: name.to_string(),
        },
        token: Some("tok-1".to_string()),
    }
}

#[async_trait]
impl BillingApi for ScriptedApi {
    async fn login(&self, _request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.answer("login", None).await?;
        Ok(signed_in_as("Ada"))
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.answer("register", None).await?;
        Ok(signed_in_as(&request.first_name))
    }

    async fn request_password_reset(&self, _request: &PasswordResetRequest) -> ApiResult<()> {
        self.answer("request-password-reset", None).await
    }

    async fn verify_otp(&self, _request: &VerifyOtpRequest) -> ApiResult<()> {
        self.answer("verify-otp", None).await
    }

    async fn update_password(&self, _request: &UpdatePasswordRequest) -> ApiResult<()> {
        self.answer("update-password", None).await
    }

    async fn purchase(&self, token: Option<&str>, request: &PurchaseRequest) -> ApiResult<()> {
        let operation = match request {
            PurchaseRequest::Airtime { .. } => "airtime",
            PurchaseRequest::Data { .. } => "data",
            PurchaseRequest::Electricity { .. } => "electricity",
            PurchaseRequest::CableTv { .. } => "cable-tv",
        };
        self.answer(operation, token).await
    }

    async fn submit_feedback(
        &self,
        token: Option<&str>,
        _request: &FeedbackRequest,
    ) -> ApiResult<()> {
        self.answer("feedback", token).await
    }

    async fn fund_wallet(
        &self,
        token: Option<&str>,
        _request: &FundWalletRequest,
    ) -> ApiResult<FundWalletResponse> {
        self.answer("fund-wallet", token).await?;
        Ok(FundWalletResponse {
            transaction_id: TransactionId::from("tx-1"),
        })
    }

    async fn verify_funding(
        &self,
        token: Option<&str>,
        _request: &VerifyFundingRequest,
    ) -> ApiResult<()> {
        self.answer("verify-funding", token).await
    }

    async fn update_profile(
        &self,
        token: Option<&str>,
        _request: &UpdateProfileRequest,
    ) -> ApiResult<()> {
        self.answer("update-profile", token).await
    }

    async fn change_password(
        &self,
        token: Option<&str>,
        _request: &ChangePasswordRequest,
    ) -> ApiResult<()> {
        self.answer("change-password", token).await
    }

    async fn delete_account(&self, token: Option<&str>) -> ApiResult<()> {
        self.answer("delete-account", token).await
    }
}

/// Toasts outlive every test, so alerts stay inspectable without blocking.
fn controller(api: ScriptedApi) -> (Arc<Controller>, Arc<ScriptedApi>) {
    let api = Arc::new(api);
    let policy = AlertPolicy::Toast {
        after: Duration::from_secs(600),
    };
    (Controller::new(api.clone(), policy), api)
}

fn spawn_electricity(controller: &Arc<Controller>) -> tokio::task::JoinHandle<SubmitOutcome> {
    let controller = controller.clone();
    tokio::spawn(async move {
        controller
            .submit_service(ServiceKind::Electricity, &electricity())
            .await
    })
}

fn drain(events: &mut broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

async fn wait_for_calls(api: &ScriptedApi, count: usize) {
    while api.calls().len() < count {
        tokio::task::yield_now().await;
    }
}

fn electricity() -> FormFields {
    FormFields::new()
        .with("provider", "Ikeja Electric")
        .with("meterNumber", "45012345678")
        .with("amount", "5000")
}

#[tokio::test]
async fn login_opens_dashboard_and_authenticates_later_calls() {
    let (controller, api) = controller(ScriptedApi::default());
    controller.navigate_to(ViewState::LOGIN).await;

    let outcome = controller.submit_login("ada@example.com", "secret").await;
    assert_eq!(outcome, SubmitOutcome::Completed);

    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::OVERVIEW);
    assert_eq!(state.session().display_name.as_deref(), Some("Ada"));
    assert_eq!(state.alert(), Some(&Alert::success(LOGIN_SUCCESS_MESSAGE)));
    assert!(!state.is_loading(FormKey::Login));

    let airtime = FormFields::new()
        .with("network", "MTN")
        .with("phone", "08031234567")
        .with("amount", "100");
    assert_eq!(
        controller.submit_service(ServiceKind::Airtime, &airtime).await,
        SubmitOutcome::Completed
    );
    assert_eq!(
        api.calls(),
        vec![("login", None), ("airtime", Some("tok-1".to_string()))]
    );
}

#[tokio::test]
async fn rejected_login_shows_server_message_and_stays() {
    let (controller, _api) = controller(
        ScriptedApi::default().reply("login", Reply::Reject(401, Some("Invalid credentials"))),
    );
    controller.navigate_to(ViewState::LOGIN).await;

    let outcome = controller.submit_login("ada@example.com", "wrong").await;
    assert_eq!(outcome, SubmitOutcome::Failed);

    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::LOGIN);
    assert!(!state.session().is_authenticated);
    assert_eq!(state.alert(), Some(&Alert::failure("Invalid credentials")));
    assert!(state.submit_enabled(FormKey::Login));
}

#[tokio::test]
async fn failure_without_message_uses_generic_text() {
    let (controller, _api) =
        controller(ScriptedApi::default().reply("login", Reply::Reject(500, None)));

    controller.submit_login("ada@example.com", "pw").await;
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure(GENERIC_ERROR_MESSAGE))
    );
}

#[tokio::test]
async fn malformed_email_never_reaches_the_backend() {
    let (controller, api) = controller(ScriptedApi::default());

    let outcome = controller.submit_login("not-an-email", "pw").await;
    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(api.calls().is_empty());
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("Please enter a valid email address."))
    );
}

#[tokio::test]
async fn forgot_password_runs_through_every_step() {
    let (controller, api) = controller(ScriptedApi::default());
    controller
        .navigate_to(ViewState::Auth(AuthView::ForgotPassword))
        .await;

    assert_eq!(
        controller.request_password_reset("ada@example.com").await,
        SubmitOutcome::Completed
    );
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::Auth(AuthView::OtpVerify));
    assert_eq!(state.reset_flow().email(), Some("ada@example.com"));
    assert_eq!(state.alert(), Some(&Alert::success(OTP_SENT_MESSAGE)));

    assert_eq!(controller.verify_otp("123456").await, SubmitOutcome::Completed);
    assert_eq!(
        controller.snapshot().await.view(),
        ViewState::Auth(AuthView::ResetPassword)
    );

    assert_eq!(
        controller.reset_password("n3w-pass", "other").await,
        SubmitOutcome::Rejected
    );
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("Passwords do not match."))
    );

    assert_eq!(
        controller.reset_password("n3w-pass", "n3w-pass").await,
        SubmitOutcome::Completed
    );
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::LOGIN);
    assert_eq!(state.alert(), Some(&Alert::success(PASSWORD_RESET_MESSAGE)));
    assert_eq!(
        api.operations(),
        vec!["request-password-reset", "verify-otp", "update-password"]
    );
}

#[tokio::test]
async fn otp_step_requires_a_requested_reset() {
    let (controller, api) = controller(ScriptedApi::default());

    assert_eq!(controller.verify_otp("123456").await, SubmitOutcome::Rejected);
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("Please request an OTP first."))
    );
    assert_eq!(
        controller.reset_password("a", "a").await,
        SubmitOutcome::Rejected
    );
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn wrong_otp_keeps_the_user_on_the_otp_step() {
    let (controller, _api) =
        controller(ScriptedApi::default().reply("verify-otp", Reply::Reject(400, None)));
    controller
        .navigate_to(ViewState::Auth(AuthView::ForgotPassword))
        .await;
    controller.request_password_reset("ada@example.com").await;

    assert_eq!(controller.verify_otp("000000").await, SubmitOutcome::Failed);
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::Auth(AuthView::OtpVerify));
    assert_eq!(state.alert(), Some(&Alert::failure(OTP_INVALID_MESSAGE)));
}

#[tokio::test]
async fn registration_needs_accepted_terms() {
    let (controller, api) = controller(ScriptedApi::default());
    let mut registration = Registration {
        email: "grace@example.com".into(),
        password: "pw".into(),
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        phone: "08031234567".into(),
        agreed_to_terms: false,
    };

    assert_eq!(
        controller.submit_register(&registration).await,
        SubmitOutcome::Rejected
    );
    assert!(api.calls().is_empty());

    registration.agreed_to_terms = true;
    assert_eq!(
        controller.submit_register(&registration).await,
        SubmitOutcome::Completed
    );
    let state = controller.snapshot().await;
    assert_eq!(state.session().display_name.as_deref(), Some("Grace"));
    assert_eq!(state.alert(), Some(&Alert::success(REGISTER_SUCCESS_MESSAGE)));
}

#[tokio::test]
async fn services_require_a_session() {
    let (controller, api) = controller(ScriptedApi::default());

    let outcome = controller
        .submit_service(ServiceKind::Electricity, &electricity())
        .await;
    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(api.calls().is_empty());
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("You must sign in to access this service."))
    );
}

#[tokio::test]
async fn purchase_returns_to_overview_with_service_message() {
    let (controller, _api) = controller(ScriptedApi::default());
    controller.login("Ada").await;
    controller
        .navigate_to(ViewState::Dashboard(DashboardView::ServiceForm(
            ServiceKind::Electricity,
        )))
        .await;

    let outcome = controller
        .submit_service(ServiceKind::Electricity, &electricity())
        .await;
    assert_eq!(outcome, SubmitOutcome::Completed);
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::OVERVIEW);
    assert_eq!(
        state.alert(),
        Some(&Alert::success("Transaction for Electricity successful!"))
    );
}

#[tokio::test]
async fn failed_purchase_stays_on_the_form() {
    let (controller, _api) =
        controller(ScriptedApi::default().reply("electricity", Reply::Reject(502, None)));
    controller.login("Ada").await;
    let form_view = ViewState::Dashboard(DashboardView::ServiceForm(ServiceKind::Electricity));
    controller.navigate_to(form_view).await;

    let outcome = controller
        .submit_service(ServiceKind::Electricity, &electricity())
        .await;
    assert_eq!(outcome, SubmitOutcome::Failed);
    let state = controller.snapshot().await;
    assert_eq!(state.view(), form_view);
    assert_eq!(
        state.alert(),
        Some(&Alert::failure("Transaction for Electricity failed."))
    );
}

#[tokio::test]
async fn feedback_is_submitted_from_the_overview() {
    let (controller, api) = controller(ScriptedApi::default());
    controller.login("Ada").await;
    controller
        .navigate_to(ViewState::Dashboard(DashboardView::ServiceForm(
            ServiceKind::Feedback,
        )))
        .await;
    assert_eq!(controller.snapshot().await.view(), ViewState::OVERVIEW);

    let fields = FormFields::new().with("message", "Great app");
    assert_eq!(
        controller.submit_service(ServiceKind::Feedback, &fields).await,
        SubmitOutcome::Completed
    );
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::OVERVIEW);
    assert_eq!(state.alert(), Some(&Alert::success("Thank you for your feedback!")));
    assert_eq!(api.operations(), vec!["feedback"]);
}

#[tokio::test]
async fn wallet_funding_shows_initiation_then_verification() {
    let (controller, api) = controller(
        ScriptedApi::default().reply("verify-funding", Reply::Reject(402, None)),
    );
    controller.login("Ada").await;
    let mut events = controller.subscribe();

    let fields = FormFields::new()
        .with("amount", "2000")
        .with("method", "card");
    let outcome = controller
        .submit_service(ServiceKind::FundWallet, &fields)
        .await;
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(api.operations(), vec!["fund-wallet", "verify-funding"]);

    let alerts: Vec<ControllerEvent> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, ControllerEvent::AlertChanged(Some(_))))
        .collect();
    assert_eq!(
        alerts,
        vec![
            ControllerEvent::AlertChanged(Some(Alert::success("Wallet funding initiated."))),
            ControllerEvent::AlertChanged(Some(Alert::failure(WALLET_VERIFY_FAILED_MESSAGE))),
        ]
    );
    assert!(!controller
        .snapshot()
        .await
        .is_loading(FormKey::Service(ServiceKind::FundWallet)));
}

#[tokio::test]
async fn failed_funding_skips_verification() {
    let (controller, api) =
        controller(ScriptedApi::default().reply("fund-wallet", Reply::Reject(400, None)));
    controller.login("Ada").await;

    let fields = FormFields::new()
        .with("amount", "2000")
        .with("method", "ussd");
    assert_eq!(
        controller.submit_service(ServiceKind::FundWallet, &fields).await,
        SubmitOutcome::Failed
    );
    assert_eq!(api.operations(), vec!["fund-wallet"]);
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("Wallet funding failed."))
    );
}

#[tokio::test]
async fn second_submit_while_pending_is_ignored() {
    let (api, gates) = ScriptedApi::default().held(1);
    let (controller, api) = controller(api);
    controller.login("Ada").await;

    let first = spawn_electricity(&controller);
    wait_for_calls(&api, 1).await;

    let form = FormKey::Service(ServiceKind::Electricity);
    assert!(!controller.snapshot().await.submit_enabled(form));
    assert_eq!(
        controller
            .submit_service(ServiceKind::Electricity, &electricity())
            .await,
        SubmitOutcome::AlreadyPending
    );

    gates[0].notify_one();
    assert_eq!(first.await.expect("join"), SubmitOutcome::Completed);
    assert_eq!(api.calls().len(), 1);
    assert!(controller.snapshot().await.submit_enabled(form));
}

#[tokio::test]
async fn response_after_navigation_is_suppressed() {
    let (api, gates) = ScriptedApi::default().held(1);
    let (controller, api) = controller(api);
    controller.login("Ada").await;
    controller
        .navigate_to(ViewState::Dashboard(DashboardView::ServiceForm(
            ServiceKind::Electricity,
        )))
        .await;

    let pending = spawn_electricity(&controller);
    wait_for_calls(&api, 1).await;

    let elsewhere = ViewState::Dashboard(DashboardView::ServiceForm(ServiceKind::CableTv));
    controller.navigate_to(elsewhere).await;
    gates[0].notify_one();

    assert_eq!(pending.await.expect("join"), SubmitOutcome::Stale);
    let state = controller.snapshot().await;
    assert_eq!(state.view(), elsewhere);
    assert_eq!(state.alert(), None);
    assert!(!state.is_loading(FormKey::Service(ServiceKind::Electricity)));
}

#[tokio::test]
async fn logout_returns_home_and_relocks_the_dashboard() {
    let (controller, _api) = controller(ScriptedApi::default());
    controller.login("Ada").await;
    controller.logout().await;

    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::Home);
    assert!(!state.session().is_authenticated);
    assert_eq!(state.alert(), Some(&Alert::success(LOGGED_OUT_MESSAGE)));

    controller.navigate_to(ViewState::OVERVIEW).await;
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::LOGIN);
    assert_eq!(
        state.alert(),
        Some(&Alert::failure("You must sign in to access this service."))
    );
}

#[tokio::test]
async fn profile_updates_rename_the_session() {
    let (controller, api) = controller(ScriptedApi::default());
    controller.login("Ada").await;

    let update = ProfileUpdate {
        first_name: "Augusta".into(),
        last_name: "King".into(),
        phone: "08031234567".into(),
    };
    assert_eq!(
        controller.update_profile(&update).await,
        SubmitOutcome::Completed
    );
    let state = controller.snapshot().await;
    assert_eq!(state.session().display_name.as_deref(), Some("Augusta"));
    assert_eq!(state.alert(), Some(&Alert::success(PROFILE_UPDATED_MESSAGE)));

    assert_eq!(
        controller.change_password("old", "new", "nope").await,
        SubmitOutcome::Rejected
    );
    assert_eq!(api.operations(), vec!["update-profile"]);
}

#[tokio::test]
async fn deleting_the_account_ends_the_session() {
    let (controller, _api) = controller(ScriptedApi::default());
    controller.login("Ada").await;

    assert_eq!(controller.delete_account().await, SubmitOutcome::Completed);
    let state = controller.snapshot().await;
    assert!(!state.session().is_authenticated);
    assert_eq!(state.view(), ViewState::Home);
    assert_eq!(state.alert(), Some(&Alert::success(ACCOUNT_DELETED_MESSAGE)));
}

#[tokio::test]
async fn dismissing_twice_is_harmless() {
    let (controller, _api) = controller(ScriptedApi::default());
    let mut events = controller.subscribe();

    controller.show_alert("Saved", true).await;
    controller.dismiss_alert().await;
    controller.dismiss_alert().await;

    assert_eq!(controller.snapshot().await.alert(), None);
    assert_eq!(
        drain(&mut events),
        vec![
            ControllerEvent::AlertChanged(Some(Alert::success("Saved"))),
            ControllerEvent::AlertChanged(None),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn toast_expires_after_its_timeout() {
    let api = Arc::new(ScriptedApi::default());
    let controller = Controller::new(
        api,
        AlertPolicy::Toast {
            after: Duration::from_millis(3000),
        },
    );

    controller.show_alert("first", true).await;
    tokio::time::sleep(Duration::from_millis(2000)).await;
    controller.show_alert("second", false).await;

    // The first timer fires here but must not clear the newer alert.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    tokio::task::yield_now().await;
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("second"))
    );

    tokio::time::sleep(Duration::from_millis(1600)).await;
    tokio::task::yield_now().await;
    assert_eq!(controller.snapshot().await.alert(), None);
}

#[tokio::test(start_paused = true)]
async fn modal_alerts_wait_for_dismissal() {
    let controller = Controller::new(Arc::new(ScriptedApi::default()), AlertPolicy::Modal);
    controller.show_alert("Stay", true).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::success("Stay"))
    );
}

#[tokio::test]
async fn modal_alert_holds_navigation_and_submits_until_dismissed() {
    let api = Arc::new(ScriptedApi::default());
    let controller = Controller::new(api.clone(), AlertPolicy::Modal);
    controller.show_alert("Read me", false).await;

    controller.navigate_to(ViewState::LOGIN).await;
    assert_eq!(controller.snapshot().await.view(), ViewState::Home);
    assert_eq!(
        controller.submit_login("ada@example.com", "secret").await,
        SubmitOutcome::Rejected
    );
    assert!(api.calls().is_empty());
    assert_eq!(
        controller.snapshot().await.alert(),
        Some(&Alert::failure("Read me"))
    );

    controller.dismiss_alert().await;
    controller.navigate_to(ViewState::LOGIN).await;
    assert_eq!(
        controller.submit_login("ada@example.com", "secret").await,
        SubmitOutcome::Completed
    );

    // The login alert is modal too, so logging out waits for it.
    controller.logout().await;
    let state = controller.snapshot().await;
    assert!(state.session().is_authenticated);
    assert_eq!(state.alert(), Some(&Alert::success(LOGIN_SUCCESS_MESSAGE)));

    controller.dismiss_alert().await;
    controller.logout().await;
    assert!(!controller.snapshot().await.session().is_authenticated);
    assert_eq!(api.operations(), vec!["login"]);
}

#[tokio::test]
async fn stale_response_leaves_a_newer_submission_loading() {
    let (api, gates) = ScriptedApi::default().held(2);
    let (controller, api) = controller(api);
    let form = FormKey::Service(ServiceKind::Electricity);
    controller.login("Ada").await;

    let first = spawn_electricity(&controller);
    wait_for_calls(&api, 1).await;
    controller.logout().await;
    controller.login("Ada").await;
    let second = spawn_electricity(&controller);
    wait_for_calls(&api, 2).await;

    gates[0].notify_one();
    assert_eq!(first.await.expect("join"), SubmitOutcome::Stale);
    assert!(controller.snapshot().await.is_loading(form));
    assert_eq!(
        controller
            .submit_service(ServiceKind::Electricity, &electricity())
            .await,
        SubmitOutcome::AlreadyPending
    );
    assert_eq!(api.calls().len(), 2);

    gates[1].notify_one();
    assert_eq!(second.await.expect("join"), SubmitOutcome::Completed);
    assert!(!controller.snapshot().await.is_loading(form));
}

#[tokio::test]
async fn verification_failure_is_reported_after_navigating_away() {
    let (api, gates) = ScriptedApi::default()
        .reply("verify-funding", Reply::Reject(402, None))
        .held(2);
    let (controller, api) = controller(api);
    controller.login("Ada").await;

    let pending = tokio::spawn({
        let controller = controller.clone();
        async move {
            let fields = FormFields::new()
                .with("amount", "2000")
                .with("method", "card");
            controller
                .submit_service(ServiceKind::FundWallet, &fields)
                .await
        }
    });
    wait_for_calls(&api, 1).await;
    gates[0].notify_one();
    wait_for_calls(&api, 2).await;

    let profile = ViewState::Dashboard(DashboardView::ProfileAction(ProfileAction::EditProfile));
    controller.navigate_to(profile).await;
    gates[1].notify_one();

    assert_eq!(pending.await.expect("join"), SubmitOutcome::Failed);
    let state = controller.snapshot().await;
    assert_eq!(state.view(), profile);
    assert_eq!(
        state.alert(),
        Some(&Alert::failure(WALLET_VERIFY_FAILED_MESSAGE))
    );
    assert!(!state.is_loading(FormKey::Service(ServiceKind::FundWallet)));
}

#[tokio::test]
async fn otp_request_needs_the_forgot_password_form() {
    let (controller, api) = controller(ScriptedApi::default());

    assert_eq!(
        controller.request_password_reset("ada@example.com").await,
        SubmitOutcome::Rejected
    );
    let state = controller.snapshot().await;
    assert_eq!(state.view(), ViewState::Home);
    assert_eq!(
        state.alert(),
        Some(&Alert::failure(
            "Open the forgot password form to request an OTP."
        ))
    );
    assert!(api.calls().is_empty());
}
