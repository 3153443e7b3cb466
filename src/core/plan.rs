use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Duration used when the backend omits or zeroes the minutes field.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// The structured output contract for plan mode. Parsed strictly: a response
/// that does not match is a hard failure, never partially trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingPlan {
    pub analysis: String,
    pub routine: Vec<RoutineItem>,
    pub resources: Vec<ResourceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineItem {
    pub activity: String,
    /// 24-hour start time, `HH:MM`.
    pub time: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: String,
}

impl RoutineItem {
    pub fn duration_or_default(&self) -> u32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_DURATION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub name: String,
    pub category: String,
}

/// Remove an enclosing markdown code fence, if the backend emitted one
/// despite being told not to. Anything else is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The fence may carry an info string ("json"); drop the whole first line.
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner.strip_prefix("json").unwrap_or(inner),
    };
    inner
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(inner)
        .trim()
}

/// Parse the backend's plan-mode response under the exact schema. A failure
/// carries the raw text so the user can see what actually came back.
pub fn parse_plan(raw: &str) -> Result<CoachingPlan> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| Error::PlanSchema {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Render a plan as readable markdown for the viewer and saved reports.
pub fn format_plan_readable(plan: &CoachingPlan) -> String {
    let mut output = String::new();

    output.push_str("# 라이프스타일 코칭 플랜\n\n");
    output.push_str("## 분석\n\n");
    output.push_str(&plan.analysis);
    output.push_str("\n\n");

    output.push_str("## 데일리 루틴\n\n");
    for item in &plan.routine {
        output.push_str(&format!(
            "- {} ({}분) {}",
            item.time,
            item.duration_or_default(),
            item.activity
        ));
        if !item.notes.is_empty() {
            output.push_str(&format!(": {}", item.notes));
        }
        output.push('\n');
    }

    if !plan.resources.is_empty() {
        output.push_str("\n## 추천 리소스\n\n");
        for resource in &plan.resources {
            output.push_str(&format!("- {} ({})\n", resource.name, resource.category));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{
        "analysis": "일찍 일어나는 삶",
        "routine": [
            {"activity": "명상", "time": "07:00", "duration_minutes": 10, "notes": "호흡에 집중"}
        ],
        "resources": [
            {"name": "Atomic Habits", "category": "book"}
        ]
    }"#;

    #[test]
    fn parses_bare_json() {
        let plan = parse_plan(BARE).expect("valid plan");
        assert_eq!(plan.routine.len(), 1);
        assert_eq!(plan.routine[0].activity, "명상");
        assert_eq!(plan.resources[0].category, "book");
    }

    #[test]
    fn fenced_json_parses_identically() {
        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(parse_plan(&fenced).unwrap(), parse_plan(BARE).unwrap());
    }

    #[test]
    fn fence_without_info_string_is_stripped() {
        let fenced = format!("```\n{BARE}\n```");
        assert_eq!(parse_plan(&fenced).unwrap(), parse_plan(BARE).unwrap());
    }

    #[test]
    fn invalid_json_is_a_hard_error_with_raw_text() {
        let err = parse_plan("definitely not json").unwrap_err();
        match err {
            crate::error::Error::PlanSchema { raw, .. } => {
                assert_eq!(raw, "definitely not json");
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    fn missing_required_field_fails() {
        assert!(parse_plan(r#"{"analysis": "x", "routine": []}"#).is_err());
    }

    #[test]
    fn duration_defaults_when_absent_or_zero() {
        let item: RoutineItem =
            serde_json::from_str(r#"{"activity": "독서", "time": "21:00"}"#).unwrap();
        assert_eq!(item.duration_or_default(), DEFAULT_DURATION_MINUTES);

        let zero: RoutineItem =
            serde_json::from_str(r#"{"activity": "독서", "time": "21:00", "duration_minutes": 0}"#)
                .unwrap();
        assert_eq!(zero.duration_or_default(), DEFAULT_DURATION_MINUTES);
    }
}
