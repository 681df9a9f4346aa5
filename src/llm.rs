//! Gemini client for receipt text interpretation.
//!
//! One prompt-completion call per run, no conversation state, no retries.
//! The reply is expected to contain a single JSON object matching the
//! receipt record schema; anything else degrades to the fallback record
//! instead of aborting the run.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::models::ReceiptRecord;

/// Prompt for converting recognized receipt text into the record schema.
///
/// The `{ocr_text}` placeholder receives the flattened OCR text verbatim.
/// The two worked examples are real Korean receipts and demonstrate
/// OCR-misread correction and multi-line menu condensation.
pub const RECEIPT_PROMPT: &str = r##"You are a highly precise data-extraction engine that converts receipt OCR text into a fixed JSON format.

### Rules ###
1. Output format: respond with exactly one valid JSON object. Never include explanations, comments, or markdown fencing (```json).
2. Key structure: the only top-level keys are 'storeName', 'address', 'menuItems' and 'totalPrice'. Do not add any other key.
3. Menu items: 'menuItems' is a list of {"name": "menu name", "price": price} objects. Leave out any item whose price cannot be identified.
4. Prices: every price must be a bare integer. Strip commas and currency symbols.
5. Missing information: when a value cannot be clearly determined, set that key to null. Never guess.
6. OCR corrections: fix obvious OCR misreads from context (e.g. '마리닝' -> '마라탕', '용용선생 영등포역점 상호' -> '용용선생 영등포역점'), but never invent information that is not in the text.
7. Menu name cleanup: when a menu is described across several lines, extract only the concise representative menu name.

### Example 1 ###

[Input OCR text]
용용선생
영등포역점
76,900원
(NH체크카드)
3인세트
고추바삭유림기/마라미요새우(3,000)
48,400
1
/간장계란볶음
64,900
밥
진로이즈백
6,000
2
12,000
결제금액
76,900
상호
강양림
대표
주소
서울특별시
영등포구
(영등포동3가)
영중로4길
9-2
1층

[Output JSON]
{
    "storeName": "용용선생 영등포역점",
    "address": "서울특별시 영등포구(영등포동3가) 영중로4길 9-2 1층",
    "menuItems": [
        {"name": "3인세트", "price": 64900},
        {"name": "진로이즈백", "price": 12000}
    ],
    "totalPrice": 76900
}

### Example 2 ###

[Input OCR text]
지지속성호
[영
수
승]
(105호)탕화쿵푸마리닝(호계) /
299-27-00913
/
김호
경기 인양시
동인구
평촌대로223번길
59 (호
계동,
서련코아빌딩)
201호
031-1234-5678
/
상
품
명
단
가
수량
금액
마라탕보통맛
9,600
1
9,600
입 계
금액
9,600
승인금액:
9,600
승인번호:
53504426
승인일시:
2025-06-21
승
인
[주문번호]
0031

[Output JSON]
{
    "storeName": "탕화쿵푸마라탕(호계)",
    "address": "경기 안양시 동안구 평촌대로223번길 59 (호계동, 서련코아빌딩) 201호",
    "menuItems": [
        {"name": "마라탕보통맛", "price": 9600}
    ],
    "totalPrice": 9600
}

### Task ###

[Input OCR text]
{ocr_text}

[Output JSON]
"##;

/// Errors from the model stage. The pipeline downgrades all of these to the
/// fallback record; they never abort the run.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to reach the model service.
    #[error("connection error: {0}")]
    Connection(String),

    /// Service answered with a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// Reply could not be turned into a receipt record.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Gemini generateContent request format.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Gemini generateContent response format (the consumed subset).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini client bound to one API key and model.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client from resolved settings.
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // generous timeout for slow models
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: settings.gemini_api_key.clone(),
            model: settings.model.clone(),
        }
    }

    /// Interpret flattened OCR text as a receipt record.
    ///
    /// Never fails: a model call failure or an unusable reply is logged and
    /// converted to [`ReceiptRecord::fallback`].
    pub async fn parse_receipt(&self, ocr_text: &str) -> ReceiptRecord {
        let prompt = RECEIPT_PROMPT.replace("{ocr_text}", ocr_text);

        let result = match self.generate(&prompt).await {
            Ok(reply) => extract_record(&reply),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => record,
            Err(e) => {
                warn!("model stage failed, using fallback record: {}", e);
                ReceiptRecord::fallback()
            }
        }
    }

    /// One generateContent call, returning the concatenated reply text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        debug!("requesting receipt interpretation from {}", self.model);
        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::Parse("empty model reply".to_string()));
        }

        Ok(text)
    }
}

/// Recover the receipt record from a free-text model reply.
///
/// Takes the first `{` through the last `}` greedily, so prose or markdown
/// fencing around the object is tolerated, then schema-parses the block.
pub fn extract_record(reply: &str) -> Result<ReceiptRecord, LlmError> {
    let brace_block = Regex::new(r"\{[\s\S]*\}").expect("valid literal regex");
    let block = brace_block
        .find(reply)
        .ok_or_else(|| LlmError::Parse("no JSON object in model reply".to_string()))?;

    serde_json::from_str(block.as_str()).map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;

    fn expected_record() -> ReceiptRecord {
        ReceiptRecord {
            store_name: Some("탕화쿵푸마라탕(호계)".to_string()),
            address: Some("경기 안양시 동안구 평촌대로223번길 59".to_string()),
            menu_items: vec![MenuItem {
                name: "마라탕보통맛".to_string(),
                price: 9600,
            }],
            total_price: Some(9600),
        }
    }

    const PURE_JSON: &str = r#"{"storeName": "탕화쿵푸마라탕(호계)", "address": "경기 안양시 동안구 평촌대로223번길 59", "menuItems": [{"name": "마라탕보통맛", "price": 9600}], "totalPrice": 9600}"#;

    #[test]
    fn test_extract_pure_json() {
        assert_eq!(extract_record(PURE_JSON).unwrap(), expected_record());
    }

    #[test]
    fn test_extract_fenced_json() {
        let reply = format!("```json\n{}\n```", PURE_JSON);
        assert_eq!(extract_record(&reply).unwrap(), expected_record());
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let reply = format!(
            "Here is the extracted receipt data:\n\n{}\n\nLet me know if you need anything else.",
            PURE_JSON
        );
        assert_eq!(extract_record(&reply).unwrap(), expected_record());
    }

    #[test]
    fn test_extract_no_object() {
        assert!(extract_record("I could not read the receipt.").is_err());
        assert!(extract_record("").is_err());
    }

    #[test]
    fn test_extract_truncated_json() {
        let truncated = r#"{"storeName": "탕화쿵푸마라탕(호계)", "menuItems": [{"name": "마라탕"#;
        assert!(extract_record(truncated).is_err());
    }

    #[test]
    fn test_extract_rejects_extra_keys() {
        let reply = r#"{"storeName": null, "address": null, "menuItems": [], "totalPrice": null, "note": "looks blurry"}"#;
        assert!(extract_record(reply).is_err());
    }

    #[test]
    fn test_prompt_has_placeholder_and_contract() {
        assert!(RECEIPT_PROMPT.contains("{ocr_text}"));
        assert!(RECEIPT_PROMPT.contains("storeName"));
        assert!(RECEIPT_PROMPT.contains("totalPrice"));
        // Exactly one substitution point.
        assert_eq!(RECEIPT_PROMPT.matches("{ocr_text}").count(), 1);
    }
}
