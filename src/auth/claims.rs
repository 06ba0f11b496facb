// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token header, claim set and claim validation.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{Segment, TimeViolation, TokenError};
use super::token::decode_segment;

/// The only signing algorithm this gate accepts.
pub const HS256: &str = "HS256";

/// Decoded token header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm. Missing or `null` reads as empty.
    #[serde(default)]
    pub alg: Option<String>,
    /// Token type, usually `JWT`. Not checked.
    #[serde(default)]
    pub typ: Option<String>,
}

impl TokenHeader {
    /// Decode and parse an encoded header segment.
    pub fn parse(segment: &str) -> Result<Self, TokenError> {
        let bytes = decode_segment(segment).ok_or(TokenError::Decode(Segment::Header))?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Decode(Segment::Header))
    }

    pub fn alg(&self) -> &str {
        self.alg.as_deref().unwrap_or_default()
    }
}

/// Claims carried in a token payload.
///
/// Values are arbitrary JSON; only `nbf`, `exp` and `user` mean anything to
/// the gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Decode and parse an encoded payload segment.
    ///
    /// A JSON `null` payload yields an empty claim set; any other non-object
    /// payload is rejected.
    pub fn parse(segment: &str) -> Result<Self, TokenError> {
        let bytes = decode_segment(segment).ok_or(TokenError::Decode(Segment::Claims))?;
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(Value::Null) => Ok(Self::default()),
            _ => Err(TokenError::Decode(Segment::Claims)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read a claim as a Unix timestamp, see [`numeric_claim`].
    pub fn numeric(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(numeric_claim)
    }

    /// The identity object carried in the `user` claim, if any.
    pub fn user(&self) -> Option<&Value> {
        self.get("user")
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Coerce a JSON claim value to a signed 64-bit integer.
///
/// Accepted representations, in order:
/// - an integer that fits in `i64`
/// - any other JSON number (big unsigned or fractional), truncated toward zero
///   and saturated to the `i64` range
/// - a non-empty decimal string
///
/// Everything else, including an empty or unparsable string, counts as the
/// claim being absent.
pub fn numeric_claim(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) if !s.is_empty() => s.parse().ok(),
        _ => None,
    }
}

/// Check `nbf` and `exp` against `now` with `skew_seconds` of tolerance.
///
/// Missing claims do not constrain the token.
pub fn check_time(claims: &ClaimSet, now: i64, skew_seconds: i64) -> Result<(), TimeViolation> {
    if let Some(nbf) = claims.numeric("nbf") {
        if now.saturating_add(skew_seconds) < nbf {
            return Err(TimeViolation::NotYetValid);
        }
    }

    if let Some(exp) = claims.numeric("exp") {
        if now.saturating_sub(skew_seconds) >= exp {
            return Err(TimeViolation::Expired);
        }
    }

    Ok(())
}

/// Boolean form of [`check_time`].
pub fn validate_time(claims: &ClaimSet, now: i64, skew_seconds: i64) -> bool {
    check_time(claims, now, skew_seconds).is_ok()
}

/// Whether `actual` is acceptable given the configured `expected` algorithm.
///
/// An empty `expected` means HS256. The header must match the expected value
/// and HS256 itself (both case-insensitively), so configuring any other
/// algorithm rejects every token.
pub fn is_alg_supported(actual: &str, expected: &str) -> bool {
    let expected = if expected.is_empty() { HS256 } else { expected };
    actual.eq_ignore_ascii_case(expected) && actual.eq_ignore_ascii_case(HS256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::encode_json;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;
    const SKEW: i64 = 30;

    fn claims(value: Value) -> ClaimSet {
        match value {
            Value::Object(map) => ClaimSet::from(map),
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn numeric_claim_accepts_integers_floats_and_strings() {
        assert_eq!(numeric_claim(&json!(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(numeric_claim(&json!(1_700_000_000u64)), Some(1_700_000_000));
        assert_eq!(numeric_claim(&json!(1_700_000_000.0)), Some(1_700_000_000));
        assert_eq!(numeric_claim(&json!(1_700_000_000.9)), Some(1_700_000_000));
        assert_eq!(numeric_claim(&json!(-5)), Some(-5));
        assert_eq!(numeric_claim(&json!("1700000000")), Some(1_700_000_000));
        assert_eq!(numeric_claim(&json!("-42")), Some(-42));
    }

    #[test]
    fn numeric_claim_saturates_huge_numbers() {
        assert_eq!(numeric_claim(&json!(u64::MAX)), Some(i64::MAX));
        assert_eq!(numeric_claim(&json!(1e300)), Some(i64::MAX));
        assert_eq!(numeric_claim(&json!(-1e300)), Some(i64::MIN));
    }

    #[test]
    fn numeric_claim_treats_other_shapes_as_absent() {
        assert_eq!(numeric_claim(&json!("")), None);
        assert_eq!(numeric_claim(&json!("soon")), None);
        assert_eq!(numeric_claim(&json!("1.5")), None);
        assert_eq!(numeric_claim(&json!(" 17")), None);
        assert_eq!(numeric_claim(&json!(null)), None);
        assert_eq!(numeric_claim(&json!(true)), None);
        assert_eq!(numeric_claim(&json!([1])), None);
        assert_eq!(numeric_claim(&json!({"at": 1})), None);
    }

    #[test]
    fn exp_representations_validate_identically() {
        let as_number = claims(json!({ "exp": 1_700_000_000 }));
        let as_string = claims(json!({ "exp": "1700000000" }));
        let as_unsigned = claims(json!({ "exp": 1_700_000_000u64 }));

        for now in [NOW - 100, NOW - 31, NOW + 29, NOW + 30, NOW + 31, NOW + 100] {
            let expected = validate_time(&as_number, now, SKEW);
            assert_eq!(validate_time(&as_string, now, SKEW), expected, "now={now}");
            assert_eq!(validate_time(&as_unsigned, now, SKEW), expected, "now={now}");
        }
    }

    #[test]
    fn expiry_boundary_honors_skew() {
        assert!(validate_time(&claims(json!({ "exp": NOW - 29 })), NOW, SKEW));
        assert_eq!(
            check_time(&claims(json!({ "exp": NOW - 30 })), NOW, SKEW),
            Err(TimeViolation::Expired)
        );
        assert_eq!(
            check_time(&claims(json!({ "exp": NOW - 31 })), NOW, SKEW),
            Err(TimeViolation::Expired)
        );
    }

    #[test]
    fn not_before_boundary_honors_skew() {
        assert!(validate_time(&claims(json!({ "nbf": NOW + 29 })), NOW, SKEW));
        assert!(validate_time(&claims(json!({ "nbf": NOW + 30 })), NOW, SKEW));
        assert_eq!(
            check_time(&claims(json!({ "nbf": NOW + 31 })), NOW, SKEW),
            Err(TimeViolation::NotYetValid)
        );
    }

    #[test]
    fn absent_or_unreadable_time_claims_do_not_constrain() {
        assert!(validate_time(&ClaimSet::default(), NOW, SKEW));
        assert!(validate_time(&claims(json!({ "exp": "", "nbf": "later" })), NOW, SKEW));
        assert!(validate_time(&claims(json!({ "exp": null })), NOW, 0));
    }

    #[test]
    fn not_before_is_checked_first() {
        let c = claims(json!({ "nbf": NOW + 100, "exp": NOW - 100 }));
        assert_eq!(check_time(&c, NOW, SKEW), Err(TimeViolation::NotYetValid));
    }

    #[test]
    fn algorithm_must_be_hs256() {
        assert!(is_alg_supported("HS256", "HS256"));
        assert!(is_alg_supported("hs256", "HS256"));
        assert!(is_alg_supported("HS256", "hs256"));
        assert!(is_alg_supported("HS256", ""));

        assert!(!is_alg_supported("none", "HS256"));
        assert!(!is_alg_supported("none", ""));
        assert!(!is_alg_supported("", ""));
        assert!(!is_alg_supported("RS256", "HS256"));
        assert!(!is_alg_supported("HS512", "HS512"));
        assert!(!is_alg_supported("HS256", "RS256"));
    }

    #[test]
    fn header_parse_reads_alg() {
        let header = TokenHeader::parse(&encode_json(&json!({"alg": "HS256", "typ": "JWT"}))).unwrap();
        assert_eq!(header.alg(), "HS256");
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let header = TokenHeader::parse(&encode_json(&json!({"typ": "JWT"}))).unwrap();
        assert_eq!(header.alg(), "");

        let header = TokenHeader::parse(&encode_json(&json!({"alg": null}))).unwrap();
        assert_eq!(header.alg(), "");
    }

    #[test]
    fn header_parse_rejects_garbage() {
        let err = Err(TokenError::Decode(Segment::Header));
        assert_eq!(TokenHeader::parse("!!!").map(|_| ()), err);
        assert_eq!(TokenHeader::parse(&encode_json(&json!([1, 2]))).map(|_| ()), err);
        assert_eq!(TokenHeader::parse(&encode_json(&json!({"alg": 256}))).map(|_| ()), err);
        assert_eq!(TokenHeader::parse("").map(|_| ()), err);
    }

    #[test]
    fn claims_parse_accepts_objects_and_null() {
        let parsed = ClaimSet::parse(&encode_json(&json!({"sub": "u1", "user": {"id": 7}}))).unwrap();
        assert_eq!(parsed.get("sub"), Some(&json!("u1")));
        assert_eq!(parsed.user(), Some(&json!({"id": 7})));

        let empty = ClaimSet::parse(&encode_json(&json!(null))).unwrap();
        assert_eq!(empty, ClaimSet::default());
    }

    #[test]
    fn claims_parse_rejects_non_objects() {
        let err = Err(TokenError::Decode(Segment::Claims));
        assert_eq!(ClaimSet::parse(&encode_json(&json!("text"))), err);
        assert_eq!(ClaimSet::parse(&encode_json(&json!([1]))), err);
        assert_eq!(ClaimSet::parse("%%%"), err);
    }
}
