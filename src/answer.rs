//! Normalizes raw lookup results into comparable outcomes.
//!
//! A resolver hands back either a lookup or a `ResolveError`; both are folded
//! into an [`Outcome`] here so the consistency engine only ever sees the
//! closed taxonomy: a normalized answer set, a skipped NS query, or one of
//! the recoverable [`ErrorKind`]s. Anything else is an unclassified
//! transport failure and aborts the run.

use std::collections::BTreeSet;

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::lookup::Lookup;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType as WireRecordType};
use log::{error, info};

use crate::error::{CheckError, ErrorKind};
use crate::zone::{Record, RecordType};

/// A normalized answer set from one nameserver.
///
/// Values are stripped of surrounding quotes, lowercased and kept as a
/// sorted set, so equality and signatures are order-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    values: BTreeSet<String>,
}

impl Answer {
    /// Builds an answer from raw value strings, normalizing each one.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Answer {
            values: values
                .into_iter()
                .map(|value| normalize_value(value.as_ref()))
                .collect(),
        }
    }

    /// The normalized value set.
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Canonical order-independent form used for cross-resolver comparison
    /// and report fields: sorted values joined by single spaces.
    pub fn signature(&self) -> String {
        self.values
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What one (record, nameserver) query produced. Created once per pair and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered; values are normalized and comparable.
    Answer(Answer),
    /// An NS query the server declined to answer; contributes no comparison
    /// data.
    Skipped,
    /// A recoverable failure, scored as a mismatch.
    Failed(ErrorKind),
}

/// Strips surrounding quote characters and lowercases one record value.
///
/// Resolvers render TXT data quoted (`"v=spf1 -all"`) while zone configs
/// usually do not; both sides go through this so they compare equal.
pub fn normalize_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase()
}

/// Converts a raw lookup result into an [`Outcome`].
///
/// # Errors
///
/// Returns `CheckError::Transport` for any resolver error outside the closed
/// recoverable taxonomy; passing such a failure off as a comparison result
/// could report false consistency.
pub fn normalize_outcome(
    record: &Record,
    server: &str,
    result: Result<Lookup, ResolveError>,
) -> Result<Outcome, CheckError> {
    let err = match result {
        Ok(lookup) => return Ok(Outcome::Answer(answer_from_lookup(record.rtype, &lookup))),
        Err(err) => err,
    };
    let Some(kind) = classify(err.kind()) else {
        return Err(CheckError::Transport {
            server: server.to_string(),
            fqdn: record.fqdn.clone(),
            rtype: record.rtype.to_string(),
            source: err,
        });
    };
    Ok(outcome_for(record, server, kind))
}

/// Maps a resolver error onto the recoverable taxonomy, or `None` for
/// anything that must be treated as a transport failure.
fn classify(kind: &ResolveErrorKind) -> Option<ErrorKind> {
    match kind {
        ResolveErrorKind::NoRecordsFound {
            response_code: ResponseCode::NXDomain,
            ..
        } => Some(ErrorKind::NotFound),
        // Covers empty answers and refusing/failing servers alike: the
        // server responded with an rcode but no data for the type.
        ResolveErrorKind::NoRecordsFound { .. } => Some(ErrorKind::NoAnswer),
        ResolveErrorKind::Timeout => Some(ErrorKind::Timeout),
        _ => None,
    }
}

/// Applies the NS special case and logs the failure.
///
/// Some authoritative servers answer NS meta-queries with no data; that is
/// observed server behavior, not a protocol requirement, and is skipped
/// rather than scored. No other record type gets this treatment.
fn outcome_for(record: &Record, server: &str, kind: ErrorKind) -> Outcome {
    if kind == ErrorKind::NoAnswer && record.rtype == RecordType::Ns {
        info!("NS record with no answer for {} from {server}", record.fqdn);
        return Outcome::Skipped;
    }
    error!(
        "*** {} for: {} {} from {server}",
        kind.as_str(),
        record.fqdn,
        record.rtype
    );
    Outcome::Failed(kind)
}

/// Collects the lookup's data for the queried type into a normalized answer.
///
/// Data of other types (e.g. CNAME chain links the resolver chased) is
/// ignored; TXT character-string segments are joined before normalization.
fn answer_from_lookup(rtype: RecordType, lookup: &Lookup) -> Answer {
    let wire_type = WireRecordType::from(rtype);
    let values = lookup
        .record_iter()
        .filter(|record| record.record_type() == wire_type)
        .filter_map(|record| record.data())
        .map(rdata_text);
    Answer::from_values(values)
}

/// Renders one rdata in the text form zone configurations use.
fn rdata_text(rdata: &RData) -> String {
    match rdata {
        // TXT data may be split into multiple character-strings; join them.
        RData::TXT(txt) => txt
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect::<Vec<_>>()
            .join(""),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::op::Query;
    use hickory_resolver::proto::rr::rdata::{A, CNAME, TXT};
    use hickory_resolver::proto::rr::{Name, Record as WireRecord};
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::sync::Arc;

    fn record(rtype: RecordType) -> Record {
        Record {
            fqdn: "api.example.com.".to_string(),
            rtype,
            ttl: 300,
            values: vec!["10.0.0.1".to_string()],
        }
    }

    #[test]
    fn test_normalize_value_strips_quotes_and_case() {
        assert_eq!(normalize_value("\"v=spf1 -ALL\""), "v=spf1 -all");
        assert_eq!(normalize_value("'ns1.Example.COM.'"), "ns1.example.com.");
        assert_eq!(normalize_value("  10.0.0.1 "), "10.0.0.1");
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = Answer::from_values(["b.example.com.", "a.example.com."]);
        let b = Answer::from_values(["A.example.com.", "B.example.com."]);
        assert_eq!(a, b);
        assert_eq!(a.signature(), "a.example.com. b.example.com.");
    }

    #[test]
    fn test_ns_no_answer_is_skipped() {
        let outcome = outcome_for(&record(RecordType::Ns), "ns1", ErrorKind::NoAnswer);
        assert_eq!(outcome, Outcome::Skipped);
    }

    #[test]
    fn test_non_ns_no_answer_fails() {
        let outcome = outcome_for(&record(RecordType::A), "ns1", ErrorKind::NoAnswer);
        assert_eq!(outcome, Outcome::Failed(ErrorKind::NoAnswer));
    }

    #[test]
    fn test_ns_timeout_still_fails() {
        // Only the NoAnswer case is special for NS records.
        let outcome = outcome_for(&record(RecordType::Ns), "ns1", ErrorKind::Timeout);
        assert_eq!(outcome, Outcome::Failed(ErrorKind::Timeout));
    }

    #[test]
    fn test_timeout_classification() {
        let err = ResolveError::from(ResolveErrorKind::Timeout);
        let outcome = normalize_outcome(&record(RecordType::A), "ns1", Err(err)).unwrap();
        assert_eq!(outcome, Outcome::Failed(ErrorKind::Timeout));
    }

    #[test]
    fn test_unclassified_error_is_fatal() {
        let err = ResolveError::from("connection refused");
        let result = normalize_outcome(&record(RecordType::A), "ns1", Err(err));
        assert!(matches!(result, Err(CheckError::Transport { .. })));
    }

    #[test]
    fn test_answer_from_lookup_normalizes() {
        let name = Name::from_str("api.example.com.").unwrap();
        let lookup = Lookup::from_rdata(
            Query::query(name, WireRecordType::A),
            RData::A(A::from(Ipv4Addr::new(10, 0, 0, 1))),
        );
        let outcome = normalize_outcome(&record(RecordType::A), "ns1", Ok(lookup)).unwrap();
        assert_eq!(
            outcome,
            Outcome::Answer(Answer::from_values(["10.0.0.1"]))
        );
    }

    #[test]
    fn test_answer_ignores_other_record_types() {
        // A CNAME chain link chased by the resolver must not leak into the
        // comparable value set.
        let name = Name::from_str("www.example.com.").unwrap();
        let target = Name::from_str("lb.example.com.").unwrap();
        let records = vec![
            WireRecord::from_rdata(name.clone(), 300, RData::CNAME(CNAME(target.clone()))),
            WireRecord::from_rdata(target, 300, RData::A(A::from(Ipv4Addr::new(10, 0, 0, 1)))),
        ];
        let lookup = Lookup::new_with_max_ttl(
            Query::query(name, WireRecordType::A),
            Arc::from(records),
        );
        let answer = answer_from_lookup(RecordType::A, &lookup);
        assert_eq!(answer, Answer::from_values(["10.0.0.1"]));
    }

    #[test]
    fn test_txt_segments_join_before_normalization() {
        let txt = TXT::new(vec!["v=spf1 ".to_string(), "-ALL".to_string()]);
        assert_eq!(rdata_text(&RData::TXT(txt)), "v=spf1 -ALL");
        assert_eq!(normalize_value("v=spf1 -ALL"), "v=spf1 -all");
    }
}
