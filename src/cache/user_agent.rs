//! User-Agent normalization.
//!
//! The GitHub REST API pretty-prints JSON when the User-Agent mentions a
//! browser or a command-line fetcher. Pretty-printed bodies hash differently,
//! so those names are swapped for case-mutated spellings before forwarding.

use crate::http::Headers;

/// Rewrites every trigger substring of the `User-Agent` header.
///
/// Replacement is a single left-to-right pass: at each position the first
/// matching trigger (in `replacements` order) wins and the scan resumes after
/// it. Does nothing when the header is absent or empty.
pub fn normalize_user_agent(headers: &mut Headers, replacements: &[(String, String)]) {
    let Some(ua) = headers.get("user-agent").filter(|ua| !ua.is_empty()) else {
        return;
    };
    let replaced = replace_all(ua, replacements);
    if replaced != ua {
        headers.set("User-Agent", replaced);
    }
}

fn replace_all(input: &str, replacements: &[(String, String)]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    'scan: while !rest.is_empty() {
        for (from, to) in replacements {
            if !from.is_empty() && rest.starts_with(from.as_str()) {
                out.push_str(to);
                rest = &rest[from.len()..];
                continue 'scan;
            }
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn normalized(ua: &str) -> Option<String> {
        let mut headers = Headers::new();
        headers.insert("User-Agent", ua);
        normalize_user_agent(&mut headers, &CacheConfig::default().user_agent_replacements);
        headers.get("user-agent").map(str::to_owned)
    }

    #[test]
    fn curl() {
        assert_eq!(normalized("curl/8.1.2").as_deref(), Some("cUrL/8.1.2"));
    }

    #[test]
    fn chrome_mentions_safari() {
        assert_eq!(
            normalized("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36").as_deref(),
            Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 sAfArI/537.36")
        );
    }

    #[test]
    fn untouched_without_trigger() {
        assert_eq!(normalized("go-github/81").as_deref(), Some("go-github/81"));
    }

    #[test]
    fn idempotent() {
        let once = normalized("Wget/1.21 Firefox/120 curl").unwrap();
        assert_eq!(once, "wGeT/1.21 fIrEfOx/120 cUrL");
        assert_eq!(normalized(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn absent_header_is_noop() {
        let mut headers = Headers::new();
        normalize_user_agent(&mut headers, &CacheConfig::default().user_agent_replacements);
        assert!(headers.is_empty());
    }

    #[test]
    fn multibyte_input() {
        assert_eq!(normalized("ünïcode curl").as_deref(), Some("ünïcode cUrL"));
    }
}
