//! Plan modifiers applied to individual attributes after defaults and
//! computed-value handling have shaped the plan.

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::Dynamic;

/// Marks the resource for replacement when the attribute changes
///
/// Only applies to updates: on create the prior state is null and there is
/// nothing to replace. Unknown planned values never trigger replacement.
pub struct RequiresReplace;

impl RequiresReplace {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = match (&request.state_value.value, &request.plan_value.value) {
            (Dynamic::Null, Dynamic::Null) => false,
            (Dynamic::Unknown, _) => false,
            (_, plan) if !plan.is_known() => false,
            (state, plan) => state != plan,
        };

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

/// Keeps the prior state value instead of showing "(known after apply)"
/// for computed attributes that do not change once set.
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value of this attribute in state will not change".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let plan_value = if request.plan_value.is_unknown()
            && !request.state_value.is_null()
            && !request.state_value.is_unknown()
        {
            request.state_value
        } else {
            request.plan_value
        };

        PlanModifierResponse {
            plan_value,
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DynamicValue};

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifierRequest {
        PlanModifierRequest {
            config_value: DynamicValue::new(plan.clone()),
            state_value: DynamicValue::new(state),
            plan_value: DynamicValue::new(plan),
            path: AttributePath::new("name"),
        }
    }

    #[test]
    fn requires_replace_when_value_changes() {
        let response =
            RequiresReplace.modify(request(Dynamic::from("old"), Dynamic::from("new")));
        assert!(response.requires_replace);
        assert_eq!(response.plan_value.value, Dynamic::from("new"));
    }

    #[test]
    fn requires_replace_ignores_unchanged_and_unknown_values() {
        assert!(!RequiresReplace
            .modify(request(Dynamic::from("same"), Dynamic::from("same")))
            .requires_replace);
        assert!(!RequiresReplace
            .modify(request(Dynamic::from("old"), Dynamic::Unknown))
            .requires_replace);
        assert!(!RequiresReplace
            .modify(request(Dynamic::Null, Dynamic::Null))
            .requires_replace);
    }

    #[test]
    fn use_state_for_unknown_restores_prior_value() {
        let response =
            UseStateForUnknown.modify(request(Dynamic::from("abc123"), Dynamic::Unknown));
        assert_eq!(response.plan_value.value, Dynamic::from("abc123"));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_keeps_unknown_without_state() {
        let response = UseStateForUnknown.modify(request(Dynamic::Null, Dynamic::Unknown));
        assert!(response.plan_value.is_unknown());
    }

    #[test]
    fn use_state_for_unknown_leaves_known_plan_alone() {
        let response =
            UseStateForUnknown.modify(request(Dynamic::from("old"), Dynamic::from("new")));
        assert_eq!(response.plan_value.value, Dynamic::from("new"));
    }
}
