//! Tests for pipeline types
//!
//! Covers outcomes, environment resolution and serialization shapes.

#[cfg(test)]
mod types_tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_step_outcome_predicates() {
        assert!(StepOutcome::Success.is_success());
        assert!(!StepOutcome::Failure.is_success());
        assert!(StepOutcome::Failure.is_failure());
        assert!(StepOutcome::Skipped.is_skipped());
        assert!(!StepOutcome::Success.is_skipped());
    }

    #[test]
    fn test_step_outcome_display() {
        assert_eq!(StepOutcome::Success.to_string(), "SUCCESS");
        assert_eq!(StepOutcome::Failure.to_string(), "FAILURE");
        assert_eq!(StepOutcome::Skipped.to_string(), "SKIPPED");
    }

    #[test]
    fn test_step_outcome_serialize() {
        let json = serde_json::to_string(&StepOutcome::Skipped).unwrap();
        assert_eq!(json, r#""skipped""#);
        let outcome: StepOutcome = serde_json::from_str(r#""failure""#).unwrap();
        assert_eq!(outcome, StepOutcome::Failure);
    }

    #[test]
    fn test_environment_set_get() {
        let env = Environment::new().set("LANG", "C");
        assert_eq!(env.get("LANG"), Some(&"C".to_string()));
        assert!(!env.is_empty());
        assert!(Environment::new().is_empty());
    }

    #[test]
    fn test_environment_resolve() {
        let vars: HashMap<&str, &str> = [("HOME", "/home/ci"), ("DIR", "docs")].into();
        let lookup = |name: &str| vars.get(name).map(|v| (*v).to_string());

        assert_eq!(
            Environment::resolve("${HOME}/${DIR}/build", lookup),
            "/home/ci/docs/build"
        );
        assert_eq!(Environment::resolve("${MISSING}/x", lookup), "${MISSING}/x");
        assert_eq!(Environment::resolve("no vars", lookup), "no vars");
        assert_eq!(Environment::resolve("${unterminated", lookup), "${unterminated");
    }

    #[test]
    fn test_push_event_serialize() {
        let event = PushEvent::branch("main").with_sha("abc");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"ref":"refs/heads/main","sha":"abc"}"#);
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::EmptyPipeline.to_string(),
            "Pipeline must have at least one step"
        );
        assert_eq!(
            PipelineError::MissingSecret {
                name: "AUTH_TOKEN".to_string()
            }
            .to_string(),
            "Secret 'AUTH_TOKEN' is not available"
        );
    }
}
