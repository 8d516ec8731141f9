//! Pulling the forecast document and its bidding zone out of a raw event.
//!
//! Events arrive as a message envelope wrapping an XML market document. The
//! helpers here never fail: a missing marker or tag yields an empty string and
//! the later stages degrade from there.

use std::sync::OnceLock;

use regex::Regex;

/// Marker after which the forecast document starts.
pub const PAYLOAD_MARKER: &str = "<msg:Payload>";
/// Closing marker of the envelope's payload element.
pub const PAYLOAD_END_MARKER: &str = "</msg:Payload>";

const REGION_TAG_PATTERN: &str =
    r"<inBiddingZone_Domain\.mRID(?:\s[^>]*)?>\s*([^<\s]+)\s*</inBiddingZone_Domain\.mRID>";

static REGION_TAG_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn region_tag_regex() -> Option<&'static Regex> {
    REGION_TAG_RE
        .get_or_init(|| Regex::new(REGION_TAG_PATTERN).ok())
        .as_ref()
}

/// Everything after the first payload marker, or `""` if there is none.
pub fn extract_event_payload(raw_event: &str) -> &str {
    raw_event
        .split_once(PAYLOAD_MARKER)
        .map(|(_, payload)| payload)
        .unwrap_or("")
}

/// The text of the first `inBiddingZone_Domain.mRID` tag, or `""`.
pub fn extract_region_code(raw_event: &str) -> String {
    region_tag_regex()
        .and_then(|re| re.captures(raw_event))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Cut the envelope's closing elements off a payload.
///
/// A payload taken with [`extract_event_payload`] still carries
/// `</msg:Payload>` and whatever follows; the XML decoder needs a single root.
pub fn strip_envelope_tail(payload: &str) -> &str {
    payload
        .split_once(PAYLOAD_END_MARKER)
        .map(|(document, _)| document)
        .unwrap_or(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = "<msg:Event><msg:Header>h</msg:Header><msg:Payload><Doc>\
        <inBiddingZone_Domain.mRID codingScheme=\"A01\">10Y1001A1001A82H</inBiddingZone_Domain.mRID>\
        </Doc></msg:Payload></msg:Event>";

    #[test]
    fn test_payload_is_text_after_first_marker() {
        let payload = extract_event_payload(EVENT);
        assert!(payload.starts_with("<Doc>"));
        assert!(payload.ends_with("</msg:Event>"));
    }

    #[test]
    fn test_payload_split_on_first_marker_only() {
        assert_eq!(extract_event_payload("a<msg:Payload>b<msg:Payload>c"), "b<msg:Payload>c");
        assert_eq!(extract_event_payload("<msg:Payload>"), "");
    }

    #[test]
    fn test_missing_marker_yields_empty() {
        assert_eq!(extract_event_payload("<Doc/>"), "");
        assert_eq!(extract_event_payload(""), "");
    }

    #[test]
    fn test_region_code_with_attributes() {
        assert_eq!(extract_region_code(EVENT), "10Y1001A1001A82H");
    }

    #[test]
    fn test_region_code_plain_tag_and_first_match() {
        let raw = "<inBiddingZone_Domain.mRID>10YFR-RTE------C</inBiddingZone_Domain.mRID>\
            <inBiddingZone_Domain.mRID>10YBE----------2</inBiddingZone_Domain.mRID>";
        assert_eq!(extract_region_code(raw), "10YFR-RTE------C");
    }

    #[test]
    fn test_region_code_missing_yields_empty() {
        assert_eq!(extract_region_code("<Doc></Doc>"), "");
        assert_eq!(
            extract_region_code("<outBiddingZone_Domain.mRID>10YBE----------2</outBiddingZone_Domain.mRID>"),
            ""
        );
    }

    #[test]
    fn test_strip_envelope_tail() {
        let payload = extract_event_payload(EVENT);
        let document = strip_envelope_tail(payload);
        assert!(document.starts_with("<Doc>"));
        assert!(document.ends_with("</Doc>"));
        assert_eq!(strip_envelope_tail("<Doc/>"), "<Doc/>");
    }
}
