//! Query fan-out and the per-record consistency verdict.
//!
//! The dispatcher issues one query per (record, resolver) pair without
//! waiting on any other pair; a record's group of per-resolver futures is
//! awaited together before that record is scored, while other records'
//! groups stay in flight. Verdicts come back in record order regardless of
//! network completion order, so the report is diff-stable across runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesOrdered, Stream};
use log::error;

use crate::answer::{normalize_outcome, normalize_value, Outcome};
use crate::error::{CheckError, QueryStats};
use crate::resolver::Resolver;
use crate::zone::Record;

/// The scored result for one record across every nameserver. Derived, lives
/// only as long as report rendering needs it.
#[derive(Debug)]
pub struct Verdict {
    /// The configured record the verdict is about.
    pub record: Record,
    /// One outcome per resolver, in nameserver-configuration order.
    pub outcomes: Vec<Outcome>,
    /// Every participating server returned exactly the configured value set.
    pub matches_config: bool,
    /// All servers that answered agree with each other.
    pub cross_consistent: bool,
}

impl Verdict {
    /// Scores one record from its collected per-resolver outcomes.
    ///
    /// Skipped outcomes contribute no comparison data; a record where every
    /// server was skipped passes vacuously. Failed outcomes count against
    /// the configuration match but carry no signature, so cross-resolver
    /// agreement is judged over the servers that actually answered.
    pub fn score(record: Record, outcomes: Vec<Outcome>) -> Self {
        let configured: BTreeSet<String> =
            record.values.iter().map(|v| normalize_value(v)).collect();

        let mut matches_config = true;
        let mut signatures = BTreeSet::new();
        for outcome in &outcomes {
            match outcome {
                Outcome::Skipped => {}
                Outcome::Failed(_) => matches_config = false,
                Outcome::Answer(answer) => {
                    if *answer.values() != configured {
                        matches_config = false;
                    }
                    signatures.insert(answer.signature());
                }
            }
        }
        let cross_consistent = signatures.len() <= 1;

        if !matches_config {
            error!(
                "*** answers do not match configuration for {} {}",
                record.fqdn, record.rtype
            );
        }
        if !cross_consistent {
            error!(
                "*** nameservers disagree for {} {} ({} distinct answers)",
                record.fqdn,
                record.rtype,
                signatures.len()
            );
        }

        Verdict {
            record,
            outcomes,
            matches_config,
            cross_consistent,
        }
    }

    /// True when the record matches configuration and every server agrees.
    pub fn consistent(&self) -> bool {
        self.matches_config && self.cross_consistent
    }
}

/// Fans out one query per (record, resolver) pair.
///
/// Every record's query group starts immediately; concurrency is bounded
/// only by each resolver's own worker semaphore. The returned stream yields
/// one verdict per record, in the order the records were given.
///
/// A `CheckError` item (an unclassified transport failure) is fatal: the
/// caller stops consuming and the remaining groups are dropped.
pub fn dispatch(
    records: Vec<Record>,
    resolvers: &[Arc<Resolver>],
    stats: Arc<QueryStats>,
) -> impl Stream<Item = Result<Verdict, CheckError>> + Unpin {
    let mut groups = FuturesOrdered::new();
    for record in records {
        let resolvers: Vec<Arc<Resolver>> = resolvers.to_vec();
        let stats = Arc::clone(&stats);
        groups.push_back(async move {
            let raw = join_all(resolvers.iter().map(|resolver| resolver.query(&record))).await;
            let mut outcomes = Vec::with_capacity(raw.len());
            for (resolver, result) in resolvers.iter().zip(raw) {
                let outcome = normalize_outcome(&record, resolver.name(), result)?;
                match &outcome {
                    Outcome::Failed(kind) => stats.increment(*kind),
                    Outcome::Skipped => stats.increment_skipped(),
                    Outcome::Answer(_) => {}
                }
                outcomes.push(outcome);
            }
            Ok(Verdict::score(record, outcomes))
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Answer;
    use crate::error::ErrorKind;
    use crate::zone::RecordType;

    fn record(rtype: RecordType, values: &[&str]) -> Record {
        Record {
            fqdn: "api.example.com.".to_string(),
            rtype,
            ttl: 300,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn answer(values: &[&str]) -> Outcome {
        Outcome::Answer(Answer::from_values(values.iter().copied()))
    }

    #[test]
    fn test_all_servers_match_configuration() {
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![answer(&["10.0.0.1"]), answer(&["10.0.0.1"])],
        );
        assert!(verdict.matches_config);
        assert!(verdict.cross_consistent);
        assert!(verdict.consistent());
    }

    #[test]
    fn test_one_server_diverges() {
        // Two of three match configuration; the divergent third still sinks
        // both the config match and the cross-resolver agreement.
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![
                answer(&["10.0.0.1"]),
                answer(&["10.0.0.1"]),
                answer(&["10.0.0.2"]),
            ],
        );
        assert!(!verdict.matches_config);
        assert!(!verdict.cross_consistent);
        assert!(!verdict.consistent());
    }

    #[test]
    fn test_servers_agree_on_wrong_answer() {
        // Cross-consistent but not what the zone configures.
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![answer(&["10.0.0.9"]), answer(&["10.0.0.9"])],
        );
        assert!(!verdict.matches_config);
        assert!(verdict.cross_consistent);
        assert!(!verdict.consistent());
    }

    #[test]
    fn test_partial_answer_set_is_a_mismatch() {
        // Subset in either direction fails the bidirectional check.
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1", "10.0.0.2"]),
            vec![answer(&["10.0.0.1"])],
        );
        assert!(!verdict.matches_config);

        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![answer(&["10.0.0.1", "10.0.0.2"])],
        );
        assert!(!verdict.matches_config);
    }

    #[test]
    fn test_value_order_and_case_do_not_matter() {
        let verdict = Verdict::score(
            record(RecordType::Mx, &["10 Mail.Example.COM.", "20 backup.example.com."]),
            vec![
                answer(&["20 backup.example.com.", "10 mail.example.com."]),
                answer(&["10 mail.example.com.", "20 BACKUP.example.com."]),
            ],
        );
        assert!(verdict.consistent());
    }

    #[test]
    fn test_errors_fail_configuration_match() {
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![
                Outcome::Failed(ErrorKind::Timeout),
                Outcome::Failed(ErrorKind::Timeout),
                Outcome::Failed(ErrorKind::Timeout),
            ],
        );
        assert!(!verdict.matches_config);
        // Nobody answered, so there is nothing to disagree about.
        assert!(verdict.cross_consistent);
        assert!(!verdict.consistent());
    }

    #[test]
    fn test_error_beside_matching_answers() {
        let verdict = Verdict::score(
            record(RecordType::A, &["10.0.0.1"]),
            vec![answer(&["10.0.0.1"]), Outcome::Failed(ErrorKind::NotFound)],
        );
        assert!(!verdict.matches_config);
        assert!(verdict.cross_consistent);
        assert!(!verdict.consistent());
    }

    #[test]
    fn test_ns_skips_pass_vacuously() {
        let verdict = Verdict::score(
            record(RecordType::Ns, &["ns1.example.com.", "ns2.example.com."]),
            vec![Outcome::Skipped, Outcome::Skipped, Outcome::Skipped],
        );
        assert!(verdict.matches_config);
        assert!(verdict.cross_consistent);
        assert!(verdict.consistent());
    }

    #[test]
    fn test_ns_answers_still_compared_when_present() {
        let verdict = Verdict::score(
            record(RecordType::Ns, &["ns1.example.com.", "ns2.example.com."]),
            vec![
                Outcome::Skipped,
                answer(&["ns1.example.com.", "ns2.example.com."]),
            ],
        );
        assert!(verdict.consistent());

        let verdict = Verdict::score(
            record(RecordType::Ns, &["ns1.example.com.", "ns2.example.com."]),
            vec![Outcome::Skipped, answer(&["ns9.example.com."])],
        );
        assert!(!verdict.consistent());
    }
}
