use serde_json::Value;

/// Details pulled from a Gemini error body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeminiErrorHints {
    pub message: Option<String>,
    /// `google.rpc.Code` name such as `RESOURCE_EXHAUSTED`.
    pub status: Option<String>,
    pub quota_failure: bool,
}

pub fn parse_gemini_error_hints(body: &str) -> GeminiErrorHints {
    let mut hints = GeminiErrorHints::default();
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return hints;
    };

    let Some(error) = value.get("error") else {
        return hints;
    };

    hints.message = error
        .get("message")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    hints.status = error
        .get("status")
        .and_then(Value::as_str)
        .map(|text| text.to_string());

    if hints.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
        hints.quota_failure = true;
    }

    let Some(details) = error.get("details").and_then(|value| value.as_array()) else {
        return hints;
    };

    for detail in details {
        let type_url = detail.get("@type").and_then(Value::as_str).unwrap_or("");
        if type_url.ends_with("QuotaFailure")
            && detail
                .get("violations")
                .and_then(Value::as_array)
                .map(|items| !items.is_empty())
                .unwrap_or(true)
        {
            hints.quota_failure = true;
        }
    }

    hints
}
