//! Eligibility filter — which users get enrolled and invited.
//!
//! A user qualifies when they hold the collaboration plan and at least one of
//! the mail plans. The predicate is pure; fetching entitlements is the job of
//! an [`EntitlementSource`].

use provision_core::{ChangeRecord, ServicePlanAssignment, ServicePlanId, UserId};

use crate::error::RemoteError;

/// Per-user license lookup.
#[cfg_attr(test, mockall::automock)]
pub trait EntitlementSource {
    fn entitlements(&self, user: &UserId) -> Result<Vec<ServicePlanAssignment>, RemoteError>;
}

/// `required AND (any_of[0] OR any_of[1] OR …)` over service plan ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub required: ServicePlanId,
    pub any_of: Vec<ServicePlanId>,
}

impl Default for EligibilityPolicy {
    /// Teams AND (Exchange Plan 1 OR Exchange Plan 2).
    fn default() -> Self {
        Self {
            required: ServicePlanId::TEAMS,
            any_of: vec![
                ServicePlanId::EXCHANGE_STANDARD,
                ServicePlanId::EXCHANGE_ENTERPRISE,
            ],
        }
    }
}

impl EligibilityPolicy {
    /// Whether `record` qualifies given its `entitlements`.
    ///
    /// Removed records never qualify. Assignment status is not consulted.
    pub fn is_eligible(&self, record: &ChangeRecord, entitlements: &[ServicePlanAssignment]) -> bool {
        if record.is_removed {
            return false;
        }
        let holds = |plan: &ServicePlanId| entitlements.iter().any(|e| e.service_plan_id == *plan);
        holds(&self.required) && self.any_of.iter().any(holds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    mod plan {
        use provision_core::ServicePlanId;

        pub fn a() -> ServicePlanId {
            ServicePlanId::TEAMS
        }
        pub fn b1() -> ServicePlanId {
            ServicePlanId::EXCHANGE_STANDARD
        }
        pub fn b2() -> ServicePlanId {
            ServicePlanId::EXCHANGE_ENTERPRISE
        }
        /// SharePoint Online (Plan 1), irrelevant to the policy.
        pub fn other() -> ServicePlanId {
            serde_json::from_str("\"c7699d2e-19aa-44de-8edf-1736da088ca1\"").unwrap()
        }
    }

    fn holding(plans: &[ServicePlanId]) -> Vec<ServicePlanAssignment> {
        plans
            .iter()
            .map(|p| ServicePlanAssignment::new(*p, "Success"))
            .collect()
    }

    fn user() -> ChangeRecord {
        ChangeRecord::user("u1", "u1@example.com", "User One")
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![plan::b1()])]
    #[case(vec![plan::b2()])]
    #[case(vec![plan::b1(), plan::b2()])]
    #[case(vec![plan::b1(), plan::b2(), plan::other()])]
    fn without_collaboration_plan_never_eligible(#[case] plans: Vec<ServicePlanId>) {
        let policy = EligibilityPolicy::default();
        assert!(!policy.is_eligible(&user(), &holding(&plans)));
    }

    #[rstest]
    #[case(vec![plan::a(), plan::b1()])]
    #[case(vec![plan::a(), plan::b2()])]
    #[case(vec![plan::a(), plan::b1(), plan::b2()])]
    #[case(vec![plan::other(), plan::b2(), plan::a()])]
    fn collaboration_plus_any_mail_tier_is_eligible(#[case] plans: Vec<ServicePlanId>) {
        let policy = EligibilityPolicy::default();
        assert!(policy.is_eligible(&user(), &holding(&plans)));
    }

    #[test]
    fn collaboration_alone_is_not_enough() {
        let policy = EligibilityPolicy::default();
        assert!(!policy.is_eligible(&user(), &holding(&[plan::a(), plan::other()])));
    }

    #[test]
    fn both_mail_tiers_equivalent_to_either() {
        let policy = EligibilityPolicy::default();
        let both = policy.is_eligible(&user(), &holding(&[plan::a(), plan::b1(), plan::b2()]));
        let one = policy.is_eligible(&user(), &holding(&[plan::a(), plan::b1()]));
        let other = policy.is_eligible(&user(), &holding(&[plan::a(), plan::b2()]));
        assert_eq!(both, one);
        assert_eq!(both, other);
    }

    #[test]
    fn status_is_not_consulted() {
        let policy = EligibilityPolicy::default();
        let plans = vec![
            ServicePlanAssignment::new(plan::a(), "Disabled"),
            ServicePlanAssignment::new(plan::b1(), "PendingActivation"),
        ];
        assert!(policy.is_eligible(&user(), &plans));
    }

    #[test]
    fn removed_record_is_never_eligible() {
        let policy = EligibilityPolicy::default();
        let record = ChangeRecord::removed("u9");
        assert!(!policy.is_eligible(&record, &holding(&[plan::a(), plan::b1()])));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let policy = EligibilityPolicy::default();
        let plans = holding(&[plan::b2(), plan::a()]);
        let first = policy.is_eligible(&user(), &plans);
        for _ in 0..3 {
            assert_eq!(policy.is_eligible(&user(), &plans), first);
        }
    }
}
