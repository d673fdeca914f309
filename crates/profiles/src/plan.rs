//! Subscription plans and their quotas.

use serde::{Deserialize, Serialize};

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

/// Quotas attached to a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub quotes_per_month: Option<u32>,
    pub max_clients: Option<u32>,
    pub max_saved_items: Option<u32>,
    /// Whether exported PDFs carry the product watermark.
    pub watermark: bool,
}

impl Plan {
    pub const fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                quotes_per_month: Some(5),
                max_clients: Some(10),
                max_saved_items: Some(10),
                watermark: true,
            },
            Plan::Pro => PlanLimits {
                quotes_per_month: None,
                max_clients: None,
                max_saved_items: None,
                watermark: false,
            },
        }
    }
}

impl PlanLimits {
    pub fn allows_new_client(&self, existing: u32) -> bool {
        match self.max_clients {
            None => true,
            Some(max) => existing < max,
        }
    }

    pub fn allows_new_saved_item(&self, existing: u32) -> bool {
        match self.max_saved_items {
            None => true,
            Some(max) => existing < max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_quotas() {
        let limits = Plan::Free.limits();
        assert_eq!(limits.quotes_per_month, Some(5));
        assert_eq!(limits.max_clients, Some(10));
        assert_eq!(limits.max_saved_items, Some(10));
        assert!(limits.watermark);

        assert!(limits.allows_new_client(9));
        assert!(!limits.allows_new_client(10));
        assert!(limits.allows_new_saved_item(0));
        assert!(!limits.allows_new_saved_item(10));
    }

    #[test]
    fn pro_plan_is_unlimited_and_unwatermarked() {
        let limits = Plan::Pro.limits();
        assert_eq!(limits.quotes_per_month, None);
        assert!(!limits.watermark);
        assert!(limits.allows_new_client(u32::MAX - 1));
        assert!(limits.allows_new_saved_item(u32::MAX - 1));
    }
}
