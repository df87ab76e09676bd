//! 结构化输出：向模型描述期望的 JSON 结构，并从回复中提取、校验 JSON
//!
//! 回复可能是纯 JSON、```json 代码块，或夹杂说明文字的 JSON；结构不符一律视为无效。

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::core::CollaboratorError;

/// 期望输出的 JSON Schema（拼入提示词）
pub fn schema_hint<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string(&schema).unwrap_or_default()
}

/// 从 LLM 文本中提取 JSON 并反序列化为 T
pub fn extract_json<T: DeserializeOwned>(output: &str) -> Result<T, CollaboratorError> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        // 代码块内的字符串本身可能含 ```，取最后一个围栏之前的首个 { 到最后一个 }
        let rest = &trimmed[start + 7..];
        let body = rest.rfind("```").map_or(rest, |end| &rest[..end]);
        braced(body).unwrap_or(body.trim())
    } else if let Some(json) = braced(trimmed) {
        json
    } else {
        return Err(CollaboratorError::MalformedResponse(preview(trimmed)));
    };

    serde_json::from_str(json_str)
        .map_err(|e| CollaboratorError::MalformedResponse(format!("{}: {}", e, preview(json_str))))
}

fn braced(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (start <= end).then(|| &s[start..=end])
}

fn preview(s: &str) -> String {
    if s.chars().count() > 120 {
        format!("{}...", s.chars().take(120).collect::<String>())
    } else {
        s.to_string()
    }
}
