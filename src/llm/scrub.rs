use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Token prefixes that identify a provider key on their own.
const KEY_PREFIXES: [&str; 3] = ["sk-", "eyJ", "AIza"];

/// Markers whose following token is a credential.
const VALUE_MARKERS: [&str; 10] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "\"token\":\"",
    "\"secret\":\"",
    "secret=",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|&(_, c)| !is_secret_char(c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn redact_after(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker with nothing after it.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact provider keys and bearer/json/query credentials from a string.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = KEY_PREFIXES
        .iter()
        .chain(VALUE_MARKERS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in VALUE_MARKERS {
        redact_after(&mut scrubbed, marker);
    }
    for prefix in KEY_PREFIXES {
        redact_after(&mut scrubbed, prefix);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets from provider error text and cap its length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    let trimmed = scrubbed.trim();

    if trimmed.chars().count() <= MAX_API_ERROR_CHARS {
        return trimmed.to_string();
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
