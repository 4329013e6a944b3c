//! Streamed CSV report rendering.
//!
//! One header line per zone, one data line per record in `(name, type)`
//! order. Lines are written and flushed as verdicts arrive, so partial
//! progress is visible if the process is interrupted.

use std::io::Write;

use crate::answer::Outcome;
use crate::check::Verdict;

/// Writes the `name,type,ttl,<servers...>,consistent` header line.
///
/// Server columns carry the configured nameserver identifiers in
/// configuration order, matching the per-line answer fields.
pub fn write_header<W: Write>(out: &mut W, nameservers: &[String]) -> std::io::Result<()> {
    writeln!(out, "name,type,ttl,{},consistent", nameservers.join(","))
}

/// Writes one record's report line and flushes it.
pub fn write_record<W: Write>(out: &mut W, verdict: &Verdict) -> std::io::Result<()> {
    write!(
        out,
        "{},{},{}",
        verdict.record.fqdn, verdict.record.rtype, verdict.record.ttl
    )?;
    for outcome in &verdict.outcomes {
        write!(out, ",{}", outcome_field(outcome))?;
    }
    writeln!(out, ",{}", if verdict.consistent() { "True" } else { "False" })?;
    out.flush()
}

/// The report field text for one per-server outcome: normalized values
/// space-joined, an error marker, or nothing for a skipped NS query.
fn outcome_field(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Answer(answer) => answer.signature(),
        Outcome::Skipped => String::new(),
        Outcome::Failed(kind) => kind.as_str().to_string(),
    }
}
