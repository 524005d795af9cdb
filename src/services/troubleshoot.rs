//! Troubleshooting assistant boundary: render a prompt from the alert
//! context, make one call to the external model endpoint, and hand back the
//! structured answer. No retry logic, no streaming.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::NetmonConfig;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct TroubleshootRequest {
    pub device: String,
    pub metric: String,
    #[schema(value_type = Object)]
    pub value: Value,
    pub severity: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn build_prompt(request: &TroubleshootRequest) -> String {
    let mut prompt = format!(
        "You are a senior network engineer assisting with an active monitoring alert.\n\
         Device: {}\n\
         Metric: {}\n\
         Current value: {}\n\
         Severity: {}\n",
        request.device,
        request.metric,
        render_value(&request.value),
        request.severity,
    );
    if let Some(suggestion) = request
        .suggestion
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        prompt.push_str(&format!("Monitoring suggestion: {suggestion}\n"));
    }
    prompt.push_str(
        "\nRespond with a single JSON object with these keys:\n\
         \"diagnosis\": one-paragraph assessment of the most likely problem,\n\
         \"probable_causes\": array of short strings ordered by likelihood,\n\
         \"recommended_actions\": array of concrete next steps an engineer can run,\n\
         \"urgency\": one of \"low\", \"medium\", \"high\".\n\
         Do not include any text outside the JSON object.",
    );
    prompt
}

/// Model answers sometimes wrap the JSON in prose or code fences; take the
/// outermost object if one parses, otherwise return the text as-is.
fn parse_analysis(text: &str) -> Value {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return value;
            }
        }
    }
    json!({ "raw": text })
}

pub async fn analyze(
    http: &reqwest::Client,
    config: &NetmonConfig,
    request: &TroubleshootRequest,
) -> Result<Value> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| anyhow!("GEMINI_API_KEY is not configured"))?;
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        config.troubleshoot_base_url.trim_end_matches('/'),
        config.troubleshoot_model
    );
    let body = json!({
        "contents": [{ "parts": [{ "text": build_prompt(request) }] }]
    });

    let response = http
        .post(&url)
        .header("x-goog-api-key", api_key)
        .timeout(Duration::from_secs(config.troubleshoot_timeout_seconds))
        .json(&body)
        .send()
        .await
        .context("troubleshoot model request failed")?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .context("troubleshoot model returned a non-JSON body")?;
    if !status.is_success() {
        let detail = payload["error"]["message"].as_str().unwrap_or("unknown error");
        anyhow::bail!("troubleshoot model returned {status}: {detail}");
    }

    let text = payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow!("troubleshoot model response had no text candidate"))?;
    Ok(parse_analysis(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TroubleshootRequest {
        TroubleshootRequest {
            device: "SW-Floor2".to_string(),
            metric: "cpu_utilization".to_string(),
            value: json!(96.5),
            severity: "warning".to_string(),
            suggestion: Some("check spanning-tree recalculation".to_string()),
        }
    }

    #[test]
    fn prompt_carries_alert_context() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("SW-Floor2"));
        assert!(prompt.contains("cpu_utilization"));
        assert!(prompt.contains("96.5"));
        assert!(prompt.contains("warning"));
        assert!(prompt.contains("spanning-tree"));
        assert!(prompt.contains("\"urgency\""));
    }

    #[test]
    fn prompt_omits_empty_suggestion() {
        let mut req = request();
        req.suggestion = Some("   ".to_string());
        let prompt = build_prompt(&req);
        assert!(!prompt.contains("Monitoring suggestion"));
    }

    #[test]
    fn analysis_extracts_fenced_json() {
        let text = "Here you go:\n```json\n{\"diagnosis\": \"cpu spike\", \"urgency\": \"high\"}\n```";
        let parsed = parse_analysis(text);
        assert_eq!(parsed["diagnosis"], "cpu spike");
        assert_eq!(parsed["urgency"], "high");
    }

    #[test]
    fn analysis_falls_back_to_raw_text() {
        let parsed = parse_analysis("I could not produce JSON, sorry.");
        assert_eq!(parsed["raw"], "I could not produce JSON, sorry.");
    }
}
