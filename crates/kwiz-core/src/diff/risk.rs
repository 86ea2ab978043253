//! Risk classification for change items

use super::change::{ChangeAction, ChangeCategory, RiskLevel};
use crate::history::OperationType;

/// Classify one change. First matching rule wins:
///
/// 1. anything in a reset is destructive
/// 2. deleting quiz questions is destructive
/// 3. coin values, quiz settings, system settings and feature flags are caution
/// 4. any other delete is caution
/// 5. everything else is safe
pub fn classify(
    op: OperationType,
    category: ChangeCategory,
    field: &str,
    action: ChangeAction,
) -> RiskLevel {
    if op == OperationType::Reset {
        return RiskLevel::Destructive;
    }

    match (category, field, action) {
        (ChangeCategory::Quiz, "questions", ChangeAction::Delete) => RiskLevel::Destructive,
        (ChangeCategory::Rewards, "coinValues", _)
        | (ChangeCategory::Quiz, "settings", _)
        | (ChangeCategory::Settings, _, _)
        | (ChangeCategory::FeatureFlags, _, _) => RiskLevel::Caution,
        (_, _, ChangeAction::Delete) => RiskLevel::Caution,
        _ => RiskLevel::Safe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OperationType::Push, ChangeCategory::Quiz, "questions", ChangeAction::Add, RiskLevel::Safe)]
    #[case(OperationType::Push, ChangeCategory::Quiz, "questions", ChangeAction::Modify, RiskLevel::Safe)]
    #[case(OperationType::Push, ChangeCategory::Quiz, "questions", ChangeAction::Delete, RiskLevel::Destructive)]
    #[case(OperationType::Pull, ChangeCategory::Quiz, "categories", ChangeAction::Delete, RiskLevel::Caution)]
    #[case(OperationType::Pull, ChangeCategory::Quiz, "settings", ChangeAction::Modify, RiskLevel::Caution)]
    #[case(OperationType::Smart, ChangeCategory::Rewards, "coinValues", ChangeAction::Modify, RiskLevel::Caution)]
    #[case(OperationType::Smart, ChangeCategory::Rewards, "achievements", ChangeAction::Add, RiskLevel::Safe)]
    #[case(OperationType::Smart, ChangeCategory::Rewards, "achievements", ChangeAction::Delete, RiskLevel::Caution)]
    #[case(OperationType::Smart, ChangeCategory::Rewards, "popupSettings", ChangeAction::Modify, RiskLevel::Safe)]
    #[case(OperationType::Push, ChangeCategory::Settings, "configValues.maxQuestions", ChangeAction::Add, RiskLevel::Caution)]
    #[case(OperationType::Push, ChangeCategory::FeatureFlags, "darkMode", ChangeAction::Modify, RiskLevel::Caution)]
    #[case(OperationType::Reset, ChangeCategory::Quiz, "questions", ChangeAction::Add, RiskLevel::Destructive)]
    #[case(OperationType::Reset, ChangeCategory::Rewards, "popupSettings", ChangeAction::Modify, RiskLevel::Destructive)]
    fn classifies(
        #[case] op: OperationType,
        #[case] category: ChangeCategory,
        #[case] field: &str,
        #[case] action: ChangeAction,
        #[case] expected: RiskLevel,
    ) {
        assert_eq!(classify(op, category, field, action), expected);
    }
}
