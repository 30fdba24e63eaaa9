use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AppError;

// ============================================================================
// Subscription Plans
// ============================================================================

/// One row of the fixed plan table. Prices are whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub months: u32,
    pub label: &'static str,
    pub price: u64,
}

/// The four plans on offer. Never mutated.
pub const PLANS: [Plan; 4] = [
    Plan { months: 1, label: "1 month", price: 1500 },
    Plan { months: 3, label: "3 months", price: 3000 },
    Plan { months: 6, label: "6 months", price: 7500 },
    Plan { months: 12, label: "12 months", price: 15000 },
];

/// Selects a plan by its duration in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanKey {
    One,
    #[default]
    Three,
    Six,
    Twelve,
}

impl PlanKey {
    pub fn months(self) -> u32 {
        match self {
            PlanKey::One => 1,
            PlanKey::Three => 3,
            PlanKey::Six => 6,
            PlanKey::Twelve => 12,
        }
    }

    /// Look up the plan row. Infallible: every key has a row.
    pub fn plan(self) -> &'static Plan {
        let idx = match self {
            PlanKey::One => 0,
            PlanKey::Three => 1,
            PlanKey::Six => 2,
            PlanKey::Twelve => 3,
        };
        &PLANS[idx]
    }
}

impl FromStr for PlanKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PlanKey::One),
            "3" => Ok(PlanKey::Three),
            "6" => Ok(PlanKey::Six),
            "12" => Ok(PlanKey::Twelve),
            other => Err(AppError::UnknownPlan(other.to_string())),
        }
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.months())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_resolves_to_its_table_row() {
        let expected = [
            ("1", 1, "1 month", 1500),
            ("3", 3, "3 months", 3000),
            ("6", 6, "6 months", 7500),
            ("12", 12, "12 months", 15000),
        ];
        for (raw, months, label, price) in expected {
            let key: PlanKey = raw.parse().unwrap();
            let plan = key.plan();
            assert_eq!(plan.months, months);
            assert_eq!(plan.label, label);
            assert_eq!(plan.price, price);
        }
    }

    #[test]
    fn test_unknown_plan_is_rejected() {
        assert!(matches!("2".parse::<PlanKey>(), Err(AppError::UnknownPlan(_))));
        assert!("".parse::<PlanKey>().is_err());
        assert!("three".parse::<PlanKey>().is_err());
    }

    #[test]
    fn test_default_plan_is_three_months() {
        assert_eq!(PlanKey::default().plan().label, "3 months");
    }
}
