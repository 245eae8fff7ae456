//! Chat command parsing.

use tonlink_core::ReferralCode;

/// Extract the payload trailing a `/start` command.
///
/// Returns `None` when the text is not a start command at all, `Some("")`
/// for a bare `/start`. Handles the `/start@BotName` addressing form.
#[must_use]
pub fn start_payload(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next()?;

    if command != "/start" && !command.starts_with("/start@") {
        return None;
    }

    Some(parts.next().unwrap_or("").trim())
}

/// Parse a referral code out of a start payload.
///
/// Deep-link generators wrap the code in conventional `key=value` forms
/// (`ref=CODE`, `code=CODE`, `referral=CODE`); a bare code is accepted too.
/// Lowercase input is folded to the code alphabet. Anything that does not
/// parse as a code is ignored rather than rejected - the payload is
/// untrusted free text.
#[must_use]
pub fn parse_referral(payload: &str) -> Option<ReferralCode> {
    let raw = payload.trim();
    if raw.is_empty() {
        return None;
    }

    let candidate = raw.split_once('=').map_or(raw, |(key, value)| {
        match key.trim().to_ascii_lowercase().as_str() {
            "ref" | "code" | "referral" => value,
            _ => raw,
        }
    });

    ReferralCode::parse(&candidate.trim().to_ascii_uppercase()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_payload_bare() {
        assert_eq!(start_payload("/start"), Some(""));
        assert_eq!(start_payload("  /start  "), Some(""));
    }

    #[test]
    fn test_start_payload_with_text() {
        assert_eq!(start_payload("/start AB12CD34"), Some("AB12CD34"));
        assert_eq!(start_payload("/start ref=AB12CD34"), Some("ref=AB12CD34"));
    }

    #[test]
    fn test_start_payload_addressed_form() {
        assert_eq!(start_payload("/start@MiningBot AB12CD34"), Some("AB12CD34"));
    }

    #[test]
    fn test_start_payload_other_commands() {
        assert_eq!(start_payload("/help"), None);
        assert_eq!(start_payload("hello"), None);
        // Prefix must match the whole command token
        assert_eq!(start_payload("/started"), None);
    }

    #[test]
    fn test_parse_referral_bare_code() {
        let code = parse_referral("AB12CD34").expect("code");
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn test_parse_referral_key_value_wrappers() {
        for payload in ["ref=AB12CD34", "code=AB12CD34", "referral=AB12CD34", "REF=AB12CD34"] {
            let code = parse_referral(payload).expect("code");
            assert_eq!(code.as_str(), "AB12CD34", "payload: {payload}");
        }
    }

    #[test]
    fn test_parse_referral_folds_case() {
        let code = parse_referral("ab12cd34").expect("code");
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn test_parse_referral_garbage_is_ignored() {
        assert!(parse_referral("").is_none());
        assert!(parse_referral("not a code").is_none());
        assert!(parse_referral("utm=tracking").is_none());
        assert!(parse_referral("ref=").is_none());
    }
}
