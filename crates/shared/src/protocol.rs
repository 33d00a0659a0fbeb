use serde::{Deserialize, Serialize};

use crate::domain::{PlanId, ServiceKind, TransactionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub first_name: String,
}

/// Returned by both login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub new_password: String,
}

/// Body of `POST /api/purchase/{service}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "kebab-case")]
pub enum PurchaseRequest {
    #[serde(rename_all = "camelCase")]
    Airtime {
        network: String,
        phone: String,
        amount: f64,
    },
    #[serde(rename_all = "camelCase")]
    Data {
        network: String,
        plan_id: PlanId,
        phone: String,
        amount: f64,
    },
    #[serde(rename_all = "camelCase")]
    Electricity {
        provider: String,
        meter_number: String,
        amount: f64,
    },
    #[serde(rename_all = "camelCase")]
    CableTv {
        provider: String,
        smart_card_number: String,
        amount: f64,
    },
}

impl PurchaseRequest {
    pub fn service(&self) -> ServiceKind {
        match self {
            PurchaseRequest::Airtime { .. } => ServiceKind::Airtime,
            PurchaseRequest::Data { .. } => ServiceKind::Data,
            PurchaseRequest::Electricity { .. } => ServiceKind::Electricity,
            PurchaseRequest::CableTv { .. } => ServiceKind::CableTv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundingMethod {
    Card,
    BankTransfer,
    Ussd,
}

impl FundingMethod {
    pub const ALL: [FundingMethod; 3] = [
        FundingMethod::Card,
        FundingMethod::BankTransfer,
        FundingMethod::Ussd,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            FundingMethod::Card => "card",
            FundingMethod::BankTransfer => "bank-transfer",
            FundingMethod::Ussd => "ussd",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.slug().eq_ignore_ascii_case(slug.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundWalletRequest {
    pub amount: f64,
    pub method: FundingMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundWalletResponse {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyFundingRequest {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
