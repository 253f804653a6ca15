use futures::StreamExt;
use serde::Serialize;
use serde_json::{json, Value};

use crate::adapters::llm::{StreamEvent, TokenUsage};
use crate::core::ports::llm::{DynError, GenerateRequest};

#[derive(Debug, Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
}

#[derive(Debug, Serialize)]
struct GoogleContent {
    role: String,
    parts: Vec<Value>,
}

/// The whole composed prompt travels as one user content part.
fn build_request_body(prompt: &str) -> GoogleRequest {
    GoogleRequest {
        contents: vec![GoogleContent {
            role: "user".to_string(),
            parts: vec![json!({ "text": prompt })],
        }],
    }
}

fn endpoint_for(model: &str) -> String {
    format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:streamGenerateContent?alt=sse",
        model
    )
}

/// Google API keys go in the `key` query parameter; anything else is
/// treated as a bearer token.
fn uses_key_query_param(api_key: &str) -> bool {
    api_key.trim().starts_with("AIza")
}

fn texts_from_chunk(parsed: &Value) -> Vec<String> {
    parsed
        .get("candidates")
        .and_then(|candidates| candidates.as_array())
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
                .filter(|text| !text.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_u64(value: Option<&Value>) -> Option<u64> {
    value.and_then(|raw| {
        raw.as_u64().or_else(|| {
            raw.as_i64()
                .and_then(|number| (number >= 0).then_some(number as u64))
        })
    })
}

fn parse_usage(usage: &Value) -> Option<TokenUsage> {
    let parsed = TokenUsage {
        input_tokens: parse_u64(usage.get("promptTokenCount")),
        output_tokens: parse_u64(usage.get("candidatesTokenCount")),
        total_tokens: parse_u64(usage.get("totalTokenCount")),
    };

    (!parsed.is_empty()).then_some(parsed)
}

fn extract_usage(parsed: &Value) -> Option<TokenUsage> {
    parsed
        .get("usageMetadata")
        .and_then(parse_usage)
        .or_else(|| {
            parsed
                .get("response")
                .and_then(|response| response.get("usageMetadata"))
                .and_then(parse_usage)
        })
}

pub async fn generate_stream(request: GenerateRequest) -> Result<(), DynError> {
    let GenerateRequest {
        api_key,
        model,
        prompt,
        tx,
        ..
    } = request;

    let client = reqwest::Client::new();
    let base_url = endpoint_for(&model);
    let request_body = build_request_body(&prompt);

    log::debug!(
        "Google request: {}",
        serde_json::to_string_pretty(&request_body).unwrap_or_default()
    );

    let response = if uses_key_query_param(&api_key) {
        let url_with_key = format!("{base_url}&key={}", api_key.trim());
        client
            .post(&url_with_key)
            .json(&request_body)
            .send()
            .await?
    } else {
        client
            .post(&base_url)
            .bearer_auth(api_key.trim())
            .json(&request_body)
            .send()
            .await?
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Google API error ({}): {}", status, body).into());
    }

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut usage_totals = TokenUsage::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(line_end) = buffer.find('\n') {
            let line = buffer[..line_end].trim().to_string();
            buffer = buffer[line_end + 1..].to_string();

            if line.is_empty() {
                continue;
            }

            if let Some(data) = line.strip_prefix("data: ") {
                if let Ok(parsed) = serde_json::from_str::<Value>(data) {
                    if let Some(usage) = extract_usage(&parsed) {
                        usage_totals.merge_max_assign(&usage);
                    }

                    if let Some(error) = parsed.get("error") {
                        let msg = error
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or("Unknown error");
                        return Err(format!("Google API error: {}", msg).into());
                    }

                    for text in texts_from_chunk(&parsed) {
                        let _ = tx.send(StreamEvent::Text(text));
                    }
                }
            }
        }
    }

    if !usage_totals.is_empty() {
        let _ = tx.send(StreamEvent::Usage(usage_totals));
    }
    let _ = tx.send(StreamEvent::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        build_request_body, endpoint_for, extract_usage, texts_from_chunk, uses_key_query_param,
    };
    use serde_json::json;

    #[test]
    fn request_body_is_a_single_user_turn() {
        let body = build_request_body("hello there");
        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].role, "user");
        assert_eq!(body.contents[0].parts, vec![json!({"text": "hello there"})]);
    }

    #[test]
    fn endpoint_embeds_the_model_and_requests_sse() {
        let url = endpoint_for("gemini-1.5-pro");
        assert!(url.contains("/models/gemini-1.5-pro:streamGenerateContent"));
        assert!(url.ends_with("alt=sse"));
    }

    #[test]
    fn google_shaped_keys_use_the_query_parameter() {
        assert!(uses_key_query_param(" AIzaSyExample"));
        assert!(!uses_key_query_param("ya29.oauth-token"));
    }

    #[test]
    fn chunk_texts_are_extracted_in_order() {
        let chunk = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Hello "},
                        {"text": ""},
                        {"text": "world"}
                    ]
                }
            }]
        });

        assert_eq!(texts_from_chunk(&chunk), vec!["Hello ", "world"]);
        assert!(texts_from_chunk(&json!({"candidates": []})).is_empty());
    }

    #[test]
    fn usage_is_read_from_either_location() {
        let top_level = json!({
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34, "totalTokenCount": 46}
        });
        let usage = extract_usage(&top_level).expect("usage parsed");
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(34));
        assert_eq!(usage.total_tokens, Some(46));

        let nested = json!({"response": {"usageMetadata": {"totalTokenCount": 5}}});
        assert_eq!(
            extract_usage(&nested).expect("nested usage").total_tokens,
            Some(5)
        );

        assert!(extract_usage(&json!({})).is_none());
    }
}
