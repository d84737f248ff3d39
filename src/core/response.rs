use crate::utils::error::{Result, VaheatError};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Lines that open a container or a member never take a separator.
static NO_SEPARATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[{\[:,]$").expect("static regex"));

/// Parses a device reply into JSON.
pub fn parse_response(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VaheatError::malformed("empty response", raw));
    }

    serde_json::from_str(trimmed).map_err(|e| {
        tracing::warn!("JSON decoding error: {} at line {} column {}", e, e.line(), e.column());
        VaheatError::malformed(e.to_string(), raw)
    })
}

/// Repairs the multi-line output the firmware produces for `get_streaming`
/// and `get_profile` with a step, where members are not separated by commas.
///
/// Every member line gets a comma, then the comma is taken off again on lines
/// followed by a closing bracket (or by nothing). Only line ends are touched,
/// so string values keep their commas.
pub fn add_missing_commas(raw: &str) -> String {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|line| {
            let stripped = line.trim();
            if stripped.is_empty() || NO_SEPARATOR_LINE.is_match(stripped) {
                line.to_string()
            } else {
                format!("{},", line.trim_end())
            }
        })
        .collect();

    // 由後往前，記住下一個非空白行是否為結尾括號
    let mut next_closes = true;
    for line in lines.iter_mut().rev() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let ends_with_separator = stripped.ends_with(',');
        let closes = stripped.starts_with(['}', ']']);

        if next_closes && ends_with_separator {
            let end = line.trim_end().len();
            line.replace_range(end - 1..end, "");
        }
        next_closes = closes;
    }

    lines.join("\n")
}

/// Fails with `DeviceRejected` when the reply is empty (`null`, `false`, `0`,
/// `""`, `[]`, `{}`), carries `"success": false`, or has an `"error"` member.
pub fn ensure_success(response: &Value) -> Result<()> {
    let rejected = match response {
        Value::Object(map) => {
            map.is_empty()
                || map.get("success") == Some(&Value::Bool(false))
                || map.contains_key("error")
        }
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Null => true,
    };

    if rejected {
        return Err(VaheatError::DeviceRejected {
            response: response.to_string(),
        });
    }
    Ok(())
}

/// Takes the `"data"` payload out of a successful reply.
pub fn into_data(response: Value, raw: &str) -> Result<Value> {
    ensure_success(&response)?;
    match response {
        Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| VaheatError::malformed("response has no 'data' member", raw)),
        _ => Err(VaheatError::malformed("response is not a JSON object", raw)),
    }
}
