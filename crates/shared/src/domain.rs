use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_newtype!(TransactionId);
string_newtype!(PlanId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Airtime,
    Data,
    Electricity,
    CableTv,
    FundWallet,
    Feedback,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 6] = [
        ServiceKind::Airtime,
        ServiceKind::Data,
        ServiceKind::Electricity,
        ServiceKind::CableTv,
        ServiceKind::FundWallet,
        ServiceKind::Feedback,
    ];

    /// The four bill services shown on the home page and the dashboard grid.
    pub const BILLS: [ServiceKind; 4] = [
        ServiceKind::Airtime,
        ServiceKind::Data,
        ServiceKind::Electricity,
        ServiceKind::CableTv,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ServiceKind::Airtime => "Airtime",
            ServiceKind::Data => "Data",
            ServiceKind::Electricity => "Electricity",
            ServiceKind::CableTv => "Cable TV",
            ServiceKind::FundWallet => "Fund Wallet",
            ServiceKind::Feedback => "Feedback",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ServiceKind::Airtime => "airtime",
            ServiceKind::Data => "data",
            ServiceKind::Electricity => "electricity",
            ServiceKind::CableTv => "cable-tv",
            ServiceKind::FundWallet => "fund-wallet",
            ServiceKind::Feedback => "feedback",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{input}'")]
pub struct UnknownName {
    pub what: &'static str,
    pub input: String,
}

fn normalize_name(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '_'], "-")
}

impl FromStr for ServiceKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted)
            .ok_or_else(|| UnknownName {
                what: "service",
                input: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileAction {
    EditProfile,
    ChangePassword,
    ConfirmLogout,
    DeleteAccount,
}

impl ProfileAction {
    pub const ALL: [ProfileAction; 4] = [
        ProfileAction::EditProfile,
        ProfileAction::ChangePassword,
        ProfileAction::ConfirmLogout,
        ProfileAction::DeleteAccount,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ProfileAction::EditProfile => "Edit Profile",
            ProfileAction::ChangePassword => "Change Password",
            ProfileAction::ConfirmLogout => "Confirm Logout",
            ProfileAction::DeleteAccount => "Delete Account",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ProfileAction::EditProfile => "edit-profile",
            ProfileAction::ChangePassword => "change-password",
            ProfileAction::ConfirmLogout => "logout",
            ProfileAction::DeleteAccount => "delete-account",
        }
    }

    /// Logout and delete ask for an explicit confirmation step.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, ProfileAction::ConfirmLogout | ProfileAction::DeleteAccount)
    }
}

impl FromStr for ProfileAction {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        let alias = match wanted.as_str() {
            "edit" => "edit-profile",
            "password" => "change-password",
            "delete" => "delete-account",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|action| action.slug() == alias)
            .ok_or_else(|| UnknownName {
                what: "profile action",
                input: s.to_string(),
            })
    }
}
