//! Event locator: resolving a caller-supplied reference to an event.

use crate::error::{EngineError, EngineResult};

/// A caller-supplied event reference: a stable UID, a store address, or
/// both.
#[derive(Debug, Clone, Default)]
pub struct EventSelector {
    pub uid: Option<String>,
    pub address: Option<String>,
}

impl EventSelector {
    /// Selects by stable UID.
    #[must_use]
    pub fn by_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            address: None,
        }
    }

    /// Selects by store address (href or full URL).
    #[must_use]
    pub fn by_address(address: impl Into<String>) -> Self {
        Self {
            uid: None,
            address: Some(address.into()),
        }
    }

    /// ## Summary
    /// Resolves this selector to the UID to look up.
    ///
    /// A supplied UID wins outright. Otherwise a candidate is derived
    /// from the address's last path segment, stripping a `.ics` suffix
    /// and percent-decoding. The derivation leans on a store naming
    /// convention and is best-effort only; callers who know the UID
    /// should pass it directly.
    ///
    /// ## Errors
    /// Fails with a validation error when neither UID nor address is
    /// present, and with not-found when no candidate can be derived.
    pub fn resolve_uid(&self) -> EngineResult<String> {
        if let Some(uid) = &self.uid {
            return Ok(uid.clone());
        }
        if let Some(address) = &self.address {
            return derive_uid_from_address(address).ok_or_else(|| {
                EngineError::NotFound(format!("no event identifier in address: {address}"))
            });
        }
        Err(EngineError::Validation(
            "event reference needs a uid or an address".to_string(),
        ))
    }
}

/// Derives a candidate UID from a store address.
#[must_use]
pub fn derive_uid_from_address(address: &str) -> Option<String> {
    let path = address.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    let name = segment.strip_suffix(".ics").unwrap_or(segment);
    if name.is_empty() {
        return None;
    }
    Some(percent_decode(name))
}

/// Simple percent-decoding for URL path segments.
///
/// Decodes to bytes first so multi-byte UTF-8 escapes come out as the
/// characters they encode.
fn percent_decode(s: &str) -> String {
    let mut decoded: Vec<u8> = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();

    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hex: Vec<u8> = bytes.by_ref().take(2).collect();
            if hex.len() == 2
                && let Ok(hex_str) = std::str::from_utf8(&hex)
                && let Ok(byte) = u8::from_str_radix(hex_str, 16)
            {
                decoded.push(byte);
                continue;
            }
            decoded.push(b'%');
            decoded.extend_from_slice(&hex);
        } else {
            decoded.push(b);
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_wins_over_address() {
        let selector = EventSelector {
            uid: Some("direct-uid".into()),
            address: Some("https://example.com/cal/other.ics".into()),
        };
        assert_eq!(selector.resolve_uid().unwrap(), "direct-uid");
    }

    #[test]
    fn derives_from_last_segment() {
        assert_eq!(
            derive_uid_from_address("https://caldav.example.com/123/calendars/home/ABC-123.ics"),
            Some("ABC-123".into())
        );
    }

    #[test]
    fn derivation_percent_decodes() {
        assert_eq!(
            derive_uid_from_address("/cal/ABC%40example.com.ics"),
            Some("ABC@example.com".into())
        );
    }

    #[test]
    fn derivation_decodes_multibyte_escapes() {
        assert_eq!(
            derive_uid_from_address("/cal/caf%C3%A9-r%C3%A9union.ics"),
            Some("café-réunion".into())
        );
    }

    #[test]
    fn derivation_strips_query_and_trailing_slash() {
        assert_eq!(
            derive_uid_from_address("/cal/EVENT-1.ics?depth=0"),
            Some("EVENT-1".into())
        );
        assert_eq!(derive_uid_from_address("/cal/EVENT-2/"), Some("EVENT-2".into()));
    }

    #[test]
    fn empty_selector_is_rejected() {
        let err = EventSelector::default().resolve_uid().unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn bare_slash_address_yields_not_found() {
        let selector = EventSelector::by_address("/");
        assert!(matches!(
            selector.resolve_uid().unwrap_err(),
            EngineError::NotFound(_)
        ));
    }
}
