//! Service form table: which fields each service collects, how they are
//! validated, and which typed request they become.

use std::collections::BTreeMap;

use shared::{
    catalog::ServiceCatalog,
    domain::{PlanId, ServiceKind},
    protocol::{FeedbackRequest, FundWalletRequest, FundingMethod, PurchaseRequest},
};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Amount,
    Phone,
    Select(Vec<&'static str>),
    /// Options come from the plans of the network picked in the same form.
    DataPlan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceForm {
    pub kind: ServiceKind,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub submit_label: String,
    pub success_message: String,
    pub failure_message: String,
}

impl ServiceForm {
    pub fn submit_caption(&self, is_loading: bool) -> &str {
        if is_loading {
            if self.kind == ServiceKind::Feedback {
                "Submitting..."
            } else {
                "Processing..."
            }
        } else {
            &self.submit_label
        }
    }
}

/// Raw user input keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validated, typed form of a service submission.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    Purchase(PurchaseRequest),
    Feedback(FeedbackRequest),
    FundWallet(FundWalletRequest),
}

pub const WALLET_VERIFIED_MESSAGE: &str = "Wallet funding verified.";
pub const WALLET_VERIFY_FAILED_MESSAGE: &str = "Payment verification failed.";

#[derive(Debug, Clone)]
pub struct DispatchTable {
    catalog: ServiceCatalog,
    forms: Vec<ServiceForm>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new(ServiceCatalog::builtin())
    }
}

impl DispatchTable {
    pub fn new(catalog: ServiceCatalog) -> Self {
        let forms = ServiceKind::ALL
            .into_iter()
            .map(|kind| build_form(kind, &catalog))
            .collect();
        Self { catalog, forms }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Every `ServiceKind` has an entry; the table is built from `ServiceKind::ALL`.
    pub fn form(&self, kind: ServiceKind) -> &ServiceForm {
        &self.forms[kind as usize]
    }

    pub fn validate(
        &self,
        kind: ServiceKind,
        fields: &FormFields,
    ) -> Result<ServiceRequest, ValidationError> {
        let form = self.form(kind);
        for spec in &form.fields {
            required(spec.label, fields.get(spec.key))?;
        }
        let text = |key: &str| fields.get(key).map(str::trim).unwrap_or_default().to_string();

        let request = match kind {
            ServiceKind::Airtime => ServiceRequest::Purchase(PurchaseRequest::Airtime {
                network: self.provider(kind, "Network", &text("network"))?,
                phone: phone_number(&text("phone"))?,
                amount: positive_amount(&text("amount"))?,
            }),
            ServiceKind::Data => {
                let network = self.provider(kind, "Network", &text("network"))?;
                let plan_id = self.plan(&network, &text("plan"))?;
                ServiceRequest::Purchase(PurchaseRequest::Data {
                    network,
                    plan_id,
                    phone: phone_number(&text("phone"))?,
                    amount: positive_amount(&text("amount"))?,
                })
            }
            ServiceKind::Electricity => ServiceRequest::Purchase(PurchaseRequest::Electricity {
                provider: self.provider(kind, "Provider", &text("provider"))?,
                meter_number: text("meterNumber"),
                amount: positive_amount(&text("amount"))?,
            }),
            ServiceKind::CableTv => ServiceRequest::Purchase(PurchaseRequest::CableTv {
                provider: self.provider(kind, "Provider", &text("provider"))?,
                smart_card_number: text("smartCardNumber"),
                amount: positive_amount(&text("amount"))?,
            }),
            ServiceKind::FundWallet => {
                let method = text("method");
                ServiceRequest::FundWallet(FundWalletRequest {
                    amount: positive_amount(&text("amount"))?,
                    method: FundingMethod::from_slug(&method).ok_or(
                        ValidationError::UnknownOption {
                            label: "Payment Method",
                            value: method,
                        },
                    )?,
                })
            }
            ServiceKind::Feedback => ServiceRequest::Feedback(FeedbackRequest {
                message: text("message"),
            }),
        };
        Ok(request)
    }

    fn provider(
        &self,
        kind: ServiceKind,
        label: &'static str,
        value: &str,
    ) -> Result<String, ValidationError> {
        self.catalog
            .canonical_provider(kind, value)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::UnknownOption {
                label,
                value: value.to_string(),
            })
    }

    fn plan(&self, network: &str, value: &str) -> Result<PlanId, ValidationError> {
        self.catalog
            .data_plans(network)
            .iter()
            .find(|plan| plan.plan_id.as_str().eq_ignore_ascii_case(value))
            .map(|plan| plan.plan_id.clone())
            .ok_or_else(|| ValidationError::PlanNotOffered {
                plan: value.to_string(),
                network: network.to_string(),
            })
    }
}

fn build_form(kind: ServiceKind, catalog: &ServiceCatalog) -> ServiceForm {
    let amount = || FieldSpec::new("amount", "Amount (₦)", FieldKind::Amount);
    let provider_key = match kind {
        ServiceKind::Airtime | ServiceKind::Data => "network",
        _ => "provider",
    };
    let providers = |label: &'static str| {
        FieldSpec::new(
            provider_key,
            label,
            FieldKind::Select(catalog.providers(kind).to_vec()),
        )
    };

    let fields = match kind {
        ServiceKind::Airtime => vec![
            providers("Network"),
            FieldSpec::new("phone", "Phone Number", FieldKind::Phone),
            amount(),
        ],
        ServiceKind::Data => vec![
            providers("Network"),
            FieldSpec::new("plan", "Data Plan", FieldKind::DataPlan),
            FieldSpec::new("phone", "Phone Number", FieldKind::Phone),
            amount(),
        ],
        ServiceKind::Electricity => vec![
            providers("Provider"),
            FieldSpec::new("meterNumber", "Meter Number", FieldKind::Text),
            amount(),
        ],
        ServiceKind::CableTv => vec![
            providers("Provider"),
            FieldSpec::new("smartCardNumber", "Smart Card Number", FieldKind::Text),
            amount(),
        ],
        ServiceKind::FundWallet => vec![
            amount(),
            FieldSpec::new(
                "method",
                "Payment Method",
                FieldKind::Select(FundingMethod::ALL.iter().map(|m| m.slug()).collect()),
            ),
        ],
        ServiceKind::Feedback => vec![FieldSpec::new("message", "Feedback", FieldKind::LongText)],
    };

    let name = kind.display_name();
    let (title, submit_label, success_message, failure_message) = match kind {
        ServiceKind::Feedback => (
            "Give Us Feedback".to_string(),
            "Submit Feedback".to_string(),
            "Thank you for your feedback!".to_string(),
            "Failed to submit feedback.".to_string(),
        ),
        ServiceKind::FundWallet => (
            "Fund Wallet Form".to_string(),
            "Fund Wallet".to_string(),
            "Wallet funding initiated.".to_string(),
            "Wallet funding failed.".to_string(),
        ),
        _ => (
            format!("{name} Form"),
            format!("Pay for {name}"),
            format!("Transaction for {name} successful!"),
            format!("Transaction for {name} failed."),
        ),
    };

    ServiceForm {
        kind,
        title,
        fields,
        submit_label,
        success_message,
        failure_message,
    }
}

/// Rejects missing or whitespace-only input.
pub fn required<'a>(
    label: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingField { label })
}

pub fn positive_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount: f64 = raw
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| ValidationError::InvalidAmount)?;
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount)
    }
}

pub fn phone_number(raw: &str) -> Result<String, ValidationError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

pub fn email_address(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email.to_string())
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
