/*!
 * Unit-separator wire contract for batched requests.
 *
 * Each unit is framed by a `<<UNIT_i>>` marker on its own line and the payload
 * ends with `<<END>>`. A response must echo the markers `0..n` in order; any
 * other shape cannot be mapped back onto the request and is rejected.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::BackendError;

/// Terminates a batched payload
pub const END_MARKER: &str = "<<END>>";

static UNIT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<UNIT_(\d+)>>").expect("unit marker pattern is valid"));

/// Marker that opens unit `index`
pub fn unit_marker(index: usize) -> String {
    format!("<<UNIT_{}>>", index)
}

/// Frame texts for a batched request.
///
/// A single text is sent bare so the whole response is its translation.
pub fn encode_units(texts: &[String]) -> String {
    if texts.len() == 1 {
        return texts[0].clone();
    }

    let mut payload = String::new();
    for (index, text) in texts.iter().enumerate() {
        payload.push_str(&unit_marker(index));
        payload.push('\n');
        payload.push_str(text);
        payload.push('\n');
    }
    payload.push_str(END_MARKER);
    payload
}

/// Split a response back into `expected` translations.
///
/// Requests never carry blank units, so a blank translation means the model
/// dropped or shifted content and the response is rejected.
pub fn decode_units(response: &str, expected: usize) -> Result<Vec<String>, BackendError> {
    if expected == 1 {
        let text = response.trim();
        if text.is_empty() {
            return Err(BackendError::Malformed("empty response".to_string()));
        }
        return Ok(vec![text.to_string()]);
    }

    let end = response
        .rfind(END_MARKER)
        .ok_or_else(|| BackendError::Malformed("missing end marker".to_string()))?;
    let body = &response[..end];

    let markers: Vec<_> = UNIT_MARKER.captures_iter(body).collect();
    if markers.len() != expected {
        return Err(BackendError::Malformed(format!(
            "expected {} units, found {}",
            expected,
            markers.len()
        )));
    }

    let mut texts = Vec::with_capacity(expected);
    for (position, caps) in markers.iter().enumerate() {
        let index: usize = caps[1]
            .parse()
            .map_err(|_| BackendError::Malformed(format!("invalid marker '{}'", &caps[0])))?;
        if index != position {
            return Err(BackendError::Malformed(format!(
                "marker {} found at position {}",
                index, position
            )));
        }

        let whole = caps.get(0).ok_or_else(|| BackendError::Malformed("empty marker".to_string()))?;
        let start = whole.end();
        let stop = markers
            .get(position + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(body.len());

        let text = body[start..stop].trim();
        if text.is_empty() {
            return Err(BackendError::Malformed(format!("unit {} is empty", index)));
        }
        texts.push(text.to_string());
    }

    Ok(texts)
}
