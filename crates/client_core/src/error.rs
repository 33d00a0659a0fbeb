use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again later.";

/// Input problems caught before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{label} is required.")]
    MissingField { label: &'static str },
    #[error("Please enter a valid amount greater than zero.")]
    InvalidAmount,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter a valid phone number.")]
    InvalidPhone,
    #[error("'{value}' is not a valid {label}.")]
    UnknownOption { label: &'static str, value: String },
    #[error("Plan '{plan}' is not offered on {network}.")]
    PlanNotOffered { plan: String, network: String },
    #[error("Passwords do not match.")]
    PasswordsDoNotMatch,
    #[error("You must agree to the Terms & Conditions.")]
    TermsNotAccepted,
    #[error("You must sign in to access this service.")]
    SignInRequired,
    #[error("Open the forgot password form to request an OTP.")]
    ResetNotStarted,
    #[error("Please request an OTP first.")]
    OtpNotRequested,
    #[error("Please verify your OTP first.")]
    OtpNotVerified,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request with status {status}")]
    Api { status: u16, message: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ClientError {
    /// The text shown to the user when this error ends an operation.
    pub fn alert_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(err) => err.to_string(),
            ClientError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ClientError::Api { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .unwrap_or(fallback)
                .to_string(),
            ClientError::Decode(_) | ClientError::Endpoint(_) => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
