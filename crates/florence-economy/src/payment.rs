//! Payment-proof verification over extracted document text.

use chrono::{DateTime, NaiveDate, Utc};
use florence_core::config::PaymentConfig;
use regex::Regex;
use tracing::debug;

/// dd/mm/yyyy, dd-mm-yyyy, or ISO yyyy-mm-dd.
const DATE_PATTERN: &str = r"(\d{2})[-/](\d{2})[-/](\d{4})|(\d{4})-(\d{2})-(\d{2})";

/// Outcome of a proof check. A rejection is a normal negative result,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub reason: Option<&'static str>,
    pub matched_date: Option<NaiveDate>,
}

impl Verification {
    fn accepted(date: NaiveDate) -> Self {
        Self {
            valid: true,
            reason: None,
            matched_date: Some(date),
        }
    }

    fn rejected(reason: &'static str) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            matched_date: None,
        }
    }
}

/// Checks extracted proof text against the configured keyword set and the
/// timestamp at which the user armed the payment flow.
pub struct PaymentVerifier {
    keywords: Vec<String>,
    date_pattern: Regex,
}

impl PaymentVerifier {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            date_pattern: Regex::new(DATE_PATTERN).unwrap(),
        }
    }

    /// Verify proof text against a pending payment request.
    ///
    /// Fails closed when no request is pending. Requires at least one
    /// configured keyword, then at least one recognizable date; the first
    /// matched date must not fall on a calendar day before the request.
    pub fn verify(&self, text: &str, requested_at: Option<DateTime<Utc>>) -> Verification {
        let Some(requested_at) = requested_at else {
            return Verification::rejected("no pending payment request");
        };

        let lowered = text.to_lowercase();

        if !self.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            return Verification::rejected("missing payment keywords");
        }

        let Some(date) = self.first_date(&lowered) else {
            return Verification::rejected("no date found");
        };

        if date < requested_at.date_naive() {
            debug!("payment proof dated {date} predates request {requested_at}");
            return Verification::rejected("predates request");
        }

        Verification::accepted(date)
    }

    /// First parseable date in the text. Two-digit pairs are read
    /// day-first, falling back to month-first when that yields no real
    /// calendar date.
    fn first_date(&self, text: &str) -> Option<NaiveDate> {
        for caps in self.date_pattern.captures_iter(text) {
            let parsed = if let (Some(a), Some(b), Some(y)) = (caps.get(1), caps.get(2), caps.get(3))
            {
                let a: u32 = a.as_str().parse().ok()?;
                let b: u32 = b.as_str().parse().ok()?;
                let y: i32 = y.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(y, b, a).or_else(|| NaiveDate::from_ymd_opt(y, a, b))
            } else if let (Some(y), Some(m), Some(d)) = (caps.get(4), caps.get(5), caps.get(6)) {
                NaiveDate::from_ymd_opt(
                    y.as_str().parse().ok()?,
                    m.as_str().parse().ok()?,
                    d.as_str().parse().ok()?,
                )
            } else {
                None
            };

            if parsed.is_some() {
                return parsed;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn verifier() -> PaymentVerifier {
        PaymentVerifier::new(&PaymentConfig::default())
    }

    #[test]
    fn test_no_pending_request_fails_closed() {
        let v = verifier();
        let out = v.verify("payment of 1000 on 12/05/2026", None);
        assert!(!out.valid);
        assert_eq!(out.reason, Some("no pending payment request"));
    }

    #[test]
    fn test_missing_keywords_rejected() {
        let v = verifier();
        let out = v.verify("transfer receipt 12/05/2026", Some(Utc::now()));
        assert!(!out.valid);
        assert_eq!(out.reason, Some("missing payment keywords"));
    }

    #[test]
    fn test_no_date_rejected() {
        let v = verifier();
        let out = v.verify("flutterwave payment received, thank you", Some(Utc::now()));
        assert!(!out.valid);
        assert_eq!(out.reason, Some("no date found"));
    }

    #[test]
    fn test_date_before_request_rejected() {
        let v = verifier();
        let requested = Utc::now();
        let old = (requested - Duration::days(30)).format("%d/%m/%Y").to_string();
        let out = v.verify(&format!("Flutterwave payment on {old}"), Some(requested));
        assert!(!out.valid);
        assert_eq!(out.reason, Some("predates request"));
    }

    #[test]
    fn test_keyword_and_later_date_accepted() {
        let v = verifier();
        let requested = Utc::now();
        let later = (requested + Duration::days(1)).format("%d/%m/%Y").to_string();
        let out = v.verify(
            &format!("PAYMENT confirmed via Flutterwave on {later}"),
            Some(requested),
        );
        assert!(out.valid);
        assert_eq!(
            out.matched_date,
            Some((requested + Duration::days(1)).date_naive())
        );
    }

    #[test]
    fn test_same_day_proof_accepted() {
        let v = verifier();
        let requested = Utc::now();
        let today = requested.format("%d/%m/%Y").to_string();
        let out = v.verify(&format!("florence top-up {today}"), Some(requested));
        assert!(out.valid);
    }

    #[test]
    fn test_iso_dates_recognized() {
        let v = verifier();
        let requested = Utc::now();
        let iso = (requested + Duration::days(2)).format("%Y-%m-%d").to_string();
        let out = v.verify(&format!("payment ref 77 dated {iso}"), Some(requested));
        assert!(out.valid);
    }

    #[test]
    fn test_month_first_fallback() {
        let v = verifier();
        // 25 is not a valid month, so 12/25/2099 only parses month-first.
        let out = v.verify("payment on 12/25/2099", Some(Utc::now()));
        assert!(out.valid);
        assert_eq!(out.matched_date, Some(NaiveDate::from_ymd_opt(2099, 12, 25).unwrap()));
    }
}
