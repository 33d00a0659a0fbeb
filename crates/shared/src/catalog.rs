//! Static reference data used to populate form options and the dashboard.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{PlanId, ServiceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPlan {
    pub plan_id: PlanId,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCatalog {
    data_plans: Vec<(&'static str, Vec<DataPlan>)>,
    providers: Vec<(ServiceKind, Vec<&'static str>)>,
}

fn plans(entries: &[(&str, &'static str)]) -> Vec<DataPlan> {
    entries
        .iter()
        .map(|(id, description)| DataPlan {
            plan_id: PlanId::from(*id),
            description: *description,
        })
        .collect()
}

impl ServiceCatalog {
    pub fn builtin() -> Self {
        Self {
            data_plans: vec![
                (
                    "MTN",
                    plans(&[
                        ("mtn-500mb", "500MB - 30 days"),
                        ("mtn-1gb", "1GB - 30 days"),
                        ("mtn-5gb", "5GB - 30 days"),
                    ]),
                ),
                (
                    "Glo",
                    plans(&[
                        ("glo-1gb", "1GB - 14 days"),
                        ("glo-3gb", "3GB - 30 days"),
                    ]),
                ),
                (
                    "Airtel",
                    plans(&[
                        ("airtel-750mb", "750MB - 14 days"),
                        ("airtel-2gb", "2GB - 30 days"),
                    ]),
                ),
                (
                    "9mobile",
                    plans(&[
                        ("9mobile-1gb", "1GB - 30 days"),
                        ("9mobile-4gb", "4.5GB - 30 days"),
                    ]),
                ),
            ],
            providers: vec![
                (ServiceKind::Airtime, vec!["MTN", "Glo", "Airtel", "9mobile"]),
                (ServiceKind::Data, vec!["MTN", "Glo", "Airtel", "9mobile"]),
                (
                    ServiceKind::Electricity,
                    vec!["Ikeja Electric", "Eko Electric", "Abuja Electric"],
                ),
                (ServiceKind::CableTv, vec!["DStv", "GOtv", "Startimes"]),
            ],
        }
    }

    pub fn providers(&self, kind: ServiceKind) -> &[&'static str] {
        self.providers
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, names)| names.as_slice())
            .unwrap_or(&[])
    }

    pub fn data_plans(&self, network: &str) -> &[DataPlan] {
        self.data_plans
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(network))
            .map(|(_, plans)| plans.as_slice())
            .unwrap_or(&[])
    }

    /// Canonical spelling of a provider name for `kind`, matched case-insensitively.
    pub fn canonical_provider(&self, kind: ServiceKind, name: &str) -> Option<&'static str> {
        self.providers(kind)
            .iter()
            .copied()
            .find(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: u32,
    pub service: ServiceKind,
    pub amount: &'static str,
    pub date: NaiveDate,
}

/// Wallet balance shown on the dashboard; the backend does not report it.
pub const MOCK_WALLET_BALANCE: &str = "₦1,500.00";

pub fn mock_transaction_history() -> Vec<TransactionRecord> {
    [
        (1, ServiceKind::Airtime, "₦100", (2024, 7, 28)),
        (2, ServiceKind::Data, "₦500", (2024, 7, 27)),
        (3, ServiceKind::Electricity, "₦2000", (2024, 7, 26)),
    ]
    .into_iter()
    .filter_map(|(id, service, amount, (y, m, d))| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| TransactionRecord {
            id,
            service,
            amount,
            date,
        })
    })
    .collect()
}
