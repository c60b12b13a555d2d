//! Task 3: pass/fail verdicts against the six fixed rules.

use super::{Task, TaskOutcome};
use crate::error::TaskError;
use crate::pipeline::gateway::ModelGateway;
use crate::prompts::{rule_checks_prompt, rule_checks_schema, RULES};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Evidence text used in every fallback verdict.
pub const RULE_FAILURE_EVIDENCE: &str = "Error during processing.";

/// Verdict for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pass,
    Fail,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStatus::Pass => f.write_str("pass"),
            RuleStatus::Fail => f.write_str("fail"),
        }
    }
}

// Models are inconsistent about case ("PASS", "Fail"); anything else is a
// schema violation.
impl<'de> Deserialize<'de> for RuleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(RuleStatus::Pass),
            "fail" => Ok(RuleStatus::Fail),
            other => Err(serde::de::Error::custom(format!(
                "status must be 'pass' or 'fail', got '{other}'"
            ))),
        }
    }
}

/// One entry of the rule-check list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub rule: String,
    pub status: RuleStatus,
    pub evidence: String,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: u8,
}

impl RuleCheck {
    /// The forced-fail verdict used when the task fails.
    pub fn failed(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
            status: RuleStatus::Fail,
            evidence: RULE_FAILURE_EVIDENCE.to_string(),
            confidence: 0,
        }
    }
}

/// Accepts any JSON number in 0–100; fractional values are rounded.
fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(serde::de::Error::custom(format!(
            "confidence must be within 0-100, got {value}"
        )));
    }
    Ok(value.round() as u8)
}

/// Ask for one verdict per rule.
///
/// The reply must contain exactly six entries, one per rule. Each entry is
/// paired with its rule by its `rule` text (trimmed, case-insensitive) and
/// the result is returned in [`RULES`] order with the canonical wording.
/// Reply order does not matter.
pub async fn check_rules(
    gateway: &ModelGateway,
    text: &str,
    max_chars: usize,
) -> TaskOutcome<Vec<RuleCheck>> {
    info!("Starting task: rule checks");
    let reply = match gateway
        .request::<Vec<RuleCheck>>(rule_checks_prompt(text, max_chars), rule_checks_schema())
        .await
    {
        Ok(reply) => reply,
        Err(e) => return TaskOutcome::failed(Task::RuleChecks, TaskError::gateway("rule checks", e)),
    };

    let result = if reply.value.len() != RULES.len() {
        Err(TaskError::RuleCountMismatch {
            expected: RULES.len(),
            actual: reply.value.len(),
        })
    } else {
        pair_with_rules(reply.value)
    };

    TaskOutcome {
        task: Task::RuleChecks,
        result,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
    }
}

fn normalise_rule(rule: &str) -> String {
    rule.trim().to_lowercase()
}

/// Place each verdict under the rule it names; every rule exactly once.
fn pair_with_rules(checks: Vec<RuleCheck>) -> Result<Vec<RuleCheck>, TaskError> {
    let mut slots: Vec<Option<RuleCheck>> = vec![None; RULES.len()];

    for mut check in checks {
        let key = normalise_rule(&check.rule);
        let idx = RULES
            .iter()
            .position(|r| normalise_rule(r) == key)
            .ok_or_else(|| TaskError::RuleMismatch {
                detail: format!("unknown rule '{}'", check.rule),
            })?;
        if slots[idx].is_some() {
            return Err(TaskError::RuleMismatch {
                detail: format!("duplicate verdict for '{}'", RULES[idx]),
            });
        }
        if check.rule != RULES[idx] {
            debug!("Normalising rule text '{}' → '{}'", check.rule, RULES[idx]);
            check.rule = RULES[idx].to_string();
        }
        slots[idx] = Some(check);
    }

    slots
        .into_iter()
        .zip(RULES)
        .map(|(slot, rule)| {
            slot.ok_or_else(|| TaskError::RuleMismatch {
                detail: format!("no verdict for '{rule}'"),
            })
        })
        .collect()
}

/// Six forced-fail verdicts, one per rule, in [`RULES`] order.
pub fn fallback_rule_checks() -> Vec<RuleCheck> {
    RULES.iter().map(|r| RuleCheck::failed(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::pipeline::gateway::testing::ScriptedBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn gateway(backend: ScriptedBackend) -> ModelGateway {
        ModelGateway::with_backend(Arc::new(backend), "m")
    }

    fn six_verdicts() -> String {
        let items: Vec<_> = RULES
            .iter()
            .enumerate()
            .map(|(i, r)| {
                json!({
                    "rule": r,
                    "status": if i % 2 == 0 { "PASS" } else { "fail" },
                    "evidence": format!("section {}", i + 1),
                    "confidence": 80 + i
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[tokio::test]
    async fn parses_six_verdicts() {
        let gw = gateway(ScriptedBackend::new().reply("Rules to check", six_verdicts()));
        let checks = check_rules(&gw, "act", 15_000).await.result.unwrap();
        assert_eq!(checks.len(), 6);
        assert_eq!(checks[0].status, RuleStatus::Pass);
        assert_eq!(checks[1].status, RuleStatus::Fail);
        assert_eq!(checks[5].confidence, 85);
    }

    #[tokio::test]
    async fn rule_text_is_normalised() {
        let items: Vec<_> = RULES
            .iter()
            .map(|r| json!({"rule": format!("  {}  ", r.to_uppercase()), "status": "pass", "evidence": "e", "confidence": 50}))
            .collect();
        let gw = gateway(
            ScriptedBackend::new().reply("Rules to check", serde_json::to_string(&items).unwrap()),
        );
        let checks = check_rules(&gw, "act", 15_000).await.result.unwrap();
        let rules: Vec<&str> = checks.iter().map(|c| c.rule.as_str()).collect();
        assert_eq!(rules, RULES);
    }

    #[tokio::test]
    async fn reordered_reply_keeps_each_verdict_with_its_rule() {
        let last = RULES[5];
        let items: Vec<_> = RULES
            .iter()
            .rev()
            .map(|r| {
                json!({
                    "rule": r,
                    "status": if *r == last { "pass" } else { "fail" },
                    "evidence": format!("evidence for {r}"),
                    "confidence": 70
                })
            })
            .collect();
        let gw = gateway(
            ScriptedBackend::new().reply("Rules to check", serde_json::to_string(&items).unwrap()),
        );
        let checks = check_rules(&gw, "act", 15_000).await.result.unwrap();

        for (check, rule) in checks.iter().zip(RULES) {
            assert_eq!(check.rule, rule);
            assert_eq!(check.evidence, format!("evidence for {rule}"));
            let expected = if rule == last { RuleStatus::Pass } else { RuleStatus::Fail };
            assert_eq!(check.status, expected, "{rule}");
        }
    }

    #[tokio::test]
    async fn unknown_rule_text_is_rejected() {
        let mut items: Vec<_> = RULES
            .iter()
            .map(|r| json!({"rule": r, "status": "pass", "evidence": "e", "confidence": 50}))
            .collect();
        items[2]["rule"] = json!("Act must be short");
        let gw = gateway(
            ScriptedBackend::new().reply("Rules to check", serde_json::to_string(&items).unwrap()),
        );
        let out = check_rules(&gw, "act", 15_000).await;
        assert!(matches!(out.result, Err(TaskError::RuleMismatch { .. })));
        assert_eq!(out.resolve(fallback_rule_checks), fallback_rule_checks());
    }

    #[tokio::test]
    async fn duplicate_rule_is_rejected() {
        let mut items: Vec<_> = RULES
            .iter()
            .map(|r| json!({"rule": r, "status": "pass", "evidence": "e", "confidence": 50}))
            .collect();
        items[4]["rule"] = json!(RULES[0]);
        let gw = gateway(
            ScriptedBackend::new().reply("Rules to check", serde_json::to_string(&items).unwrap()),
        );
        let err = check_rules(&gw, "act", 15_000).await.result.unwrap_err();
        assert!(err.to_string().contains("duplicate"), "got: {err}");
    }

    #[tokio::test]
    async fn short_list_is_rejected() {
        let gw = gateway(ScriptedBackend::new().reply(
            "Rules to check",
            r#"[{"rule": "x", "status": "pass", "evidence": "e", "confidence": 90}]"#,
        ));
        let err = check_rules(&gw, "act", 15_000).await.result.unwrap_err();
        assert_eq!(
            err,
            TaskError::RuleCountMismatch {
                expected: 6,
                actual: 1
            }
        );
    }

    #[tokio::test]
    async fn gateway_failure_resolves_to_six_fails() {
        let gw = gateway(ScriptedBackend::new().fail(
            "Rules to check",
            GatewayError::MalformedJson { detail: "eof".into() },
        ));
        let checks = check_rules(&gw, "act", 15_000)
            .await
            .resolve(fallback_rule_checks);
        assert_eq!(checks.len(), 6);
        for (check, rule) in checks.iter().zip(RULES) {
            assert_eq!(check.rule, rule);
            assert_eq!(check.status, RuleStatus::Fail);
            assert_eq!(check.evidence, RULE_FAILURE_EVIDENCE);
            assert_eq!(check.confidence, 0);
        }
    }

    #[test]
    fn status_rejects_unknown_values() {
        let err = serde_json::from_value::<RuleStatus>(json!("maybe")).unwrap_err();
        assert!(err.to_string().contains("maybe"));
        assert_eq!(
            serde_json::from_value::<RuleStatus>(json!(" Fail ")).unwrap(),
            RuleStatus::Fail
        );
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        let v = json!({"rule": "r", "status": "pass", "evidence": "e", "confidence": 140});
        assert!(serde_json::from_value::<RuleCheck>(v).is_err());
        let v = json!({"rule": "r", "status": "pass", "evidence": "e", "confidence": -1});
        assert!(serde_json::from_value::<RuleCheck>(v).is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(RuleCheck::failed("r")).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["confidence"], 0);
    }
}
