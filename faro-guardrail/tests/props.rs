use faro_guardrail::{ComplianceGuardrail, GuardrailAction, Language};
use faro_types::{AssetKind, Region};
use proptest::prelude::*;

proptest! {
    // The pipeline must be total: any input yields a well-formed result.
    #[test]
    fn process_is_total_and_bounded(text in ".{0,200}") {
        let guardrail = ComplianceGuardrail::new();
        let result = guardrail.process(&text, AssetKind::Equity, Region::Global, Language::Auto);

        prop_assert!((0.0..=1.0).contains(&result.confidence));
        prop_assert_eq!(result.original_text.as_str(), text.as_str());
        match result.action {
            GuardrailAction::Blocked => prop_assert_eq!(result.processed_text.as_str(), ""),
            _ => prop_assert!(result.is_compliant()),
        }
    }

    // Compliance state classification mirrors the action.
    #[test]
    fn compliance_flags_match_action(text in "[a-zA-Z $.%0-9]{0,120}") {
        let guardrail = ComplianceGuardrail::new();
        let result = guardrail.process(&text, AssetKind::Crypto, Region::Us, Language::En);
        prop_assert_eq!(
            result.is_compliant(),
            matches!(result.action, GuardrailAction::Passed | GuardrailAction::Modified)
        );
        prop_assert_eq!(result.was_modified(), result.action == GuardrailAction::Modified);
    }
}
