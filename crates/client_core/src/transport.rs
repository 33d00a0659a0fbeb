use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::ErrorBody,
    protocol::{
        AuthResponse, ChangePasswordRequest, FeedbackRequest, FundWalletRequest,
        FundWalletResponse, LoginRequest, PasswordResetRequest, PurchaseRequest, RegisterRequest,
        UpdatePasswordRequest, UpdateProfileRequest, VerifyFundingRequest, VerifyOtpRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::{ClientSettings, Endpoints},
    error::ClientError,
};

pub type ApiResult<T> = std::result::Result<T, ClientError>;

/// Remote operations of the billing backend.
///
/// `token` is the session bearer token, attached when present.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse>;
    async fn request_password_reset(&self, request: &PasswordResetRequest) -> ApiResult<()>;
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<()>;
    async fn update_password(&self, request: &UpdatePasswordRequest) -> ApiResult<()>;
    async fn purchase(&self, token: Option<&str>, request: &PurchaseRequest) -> ApiResult<()>;
    async fn submit_feedback(&self, token: Option<&str>, request: &FeedbackRequest)
        -> ApiResult<()>;
    async fn fund_wallet(
        &self,
        token: Option<&str>,
        request: &FundWalletRequest,
    ) -> ApiResult<FundWalletResponse>;
    async fn verify_funding(
        &self,
        token: Option<&str>,
        request: &VerifyFundingRequest,
    ) -> ApiResult<()>;
    async fn update_profile(
        &self,
        token: Option<&str>,
        request: &UpdateProfileRequest,
    ) -> ApiResult<()>;
    async fn change_password(
        &self,
        token: Option<&str>,
        request: &ChangePasswordRequest,
    ) -> ApiResult<()>;
    async fn delete_account(&self, token: Option<&str>) -> ApiResult<()>;
}

pub struct HttpBillingApi {
    http: Client,
    base_url: String,
    endpoints: Endpoints,
}

impl HttpBillingApi {
    pub fn new(
        base_url: &str,
        endpoints: Endpoints,
        timeout: Option<Duration>,
    ) -> ApiResult<Self> {
        let parsed = Url::parse(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            endpoints,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> ApiResult<Self> {
        Self::new(
            &settings.backend_url,
            settings.endpoints.clone(),
            settings.request_timeout(),
        )
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        let path = path.trim();
        let joined = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Ok(Url::parse(&joined)?)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> ApiResult<RequestBuilder> {
        let mut request = self.http.request(method, self.url(path)?);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> ApiResult<Response> {
        debug!(path, "billing request");
        let response = request.send().await.map_err(|err| {
            warn!(path, "billing request failed to send: {err}");
            ClientError::Transport(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message().map(str::to_string));
        warn!(path, status = status.as_u16(), ?message, "billing request rejected");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn post_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<()> {
        let request = self.request(Method::POST, path, token)?.json(body);
        self.send(path, request).await?;
        Ok(())
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<R> {
        let request = self.request(Method::POST, path, token)?.json(body);
        let response = self.send(path, request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.post_json(&self.endpoints.login, None, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.post_json(&self.endpoints.register, None, request).await
    }

    async fn request_password_reset(&self, request: &PasswordResetRequest) -> ApiResult<()> {
        self.post_unit(&self.endpoints.request_password_reset, None, request)
            .await
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<()> {
        self.post_unit(&self.endpoints.verify_otp, None, request).await
    }

    async fn update_password(&self, request: &UpdatePasswordRequest) -> ApiResult<()> {
        self.post_unit(&self.endpoints.update_password, None, request)
            .await
    }

    async fn purchase(&self, token: Option<&str>, request: &PurchaseRequest) -> ApiResult<()> {
        let path = self.endpoints.purchase(request.service().slug());
        self.post_unit(&path, token, request).await
    }

    async fn submit_feedback(
        &self,
        token: Option<&str>,
        request: &FeedbackRequest,
    ) -> ApiResult<()> {
        self.post_unit(&self.endpoints.feedback, token, request).await
    }

    async fn fund_wallet(
        &self,
        token: Option<&str>,
        request: &FundWalletRequest,
    ) -> ApiResult<FundWalletResponse> {
        self.post_json(&self.endpoints.fund_wallet, token, request)
            .await
    }

    async fn verify_funding(
        &self,
        token: Option<&str>,
        request: &VerifyFundingRequest,
    ) -> ApiResult<()> {
        self.post_unit(&self.endpoints.verify_funding, token, request)
            .await
    }

    async fn update_profile(
        &self,
        token: Option<&str>,
        request: &UpdateProfileRequest,
    ) -> ApiResult<()> {
        let path = &self.endpoints.update_profile;
        let request = self.request(Method::PUT, path, token)?.json(request);
        self.send(path, request).await?;
        Ok(())
    }

    async fn change_password(
        &self,
        token: Option<&str>,
        request: &ChangePasswordRequest,
    ) -> ApiResult<()> {
        self.post_unit(&self.endpoints.change_password, token, request)
            .await
    }

    async fn delete_account(&self, token: Option<&str>) -> ApiResult<()> {
        let path = &self.endpoints.delete_account;
        let request = self.request(Method::DELETE, path, token)?;
        self.send(path, request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
