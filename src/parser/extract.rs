use super::line::{FailureReason, LogRecord, ParseFailure, RawLine};
use regex::Regex;
use std::sync::LazyLock;

// Field token patterns. The input is loosely structured, so each pattern
// matches anywhere in the line and everything unrecognized is ignored.
static TIMESTAMP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bts:([^\s\]]*)").expect("valid timestamp pattern"));
static EVENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bEVNT:([A-Za-z0-9][A-Za-z0-9-]*)").expect("valid event pattern"));
static USER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\busr:(\w+)").expect("valid user pattern"));
static IPV4_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").expect("valid ip pattern"));
static PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=>(/\S+)").expect("valid path pattern"));
static PID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpid:?(\d+)").expect("valid pid pattern"));

// Named field recognizers, each a pure function over the line text returning
// the first match or `None` when the field is absent. `extract` composes them
// left to right; duplicate tokens resolve first-match-wins.

fn timestamp_token(text: &str) -> Option<&str> {
    TIMESTAMP_TOKEN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn event_type(text: &str) -> Option<String> {
    EVENT_TOKEN.captures(text).map(|caps| caps[1].to_string())
}

fn username(text: &str) -> Option<String> {
    USER_TOKEN.captures(text).map(|caps| caps[1].to_string())
}

/// First dotted-quad whose octets all fit 0-255. Out-of-range candidates are
/// skipped as "not an IP", never an error.
fn ip_address(text: &str) -> Option<String> {
    IPV4_CANDIDATE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|candidate| candidate.split('.').all(|octet| octet.parse::<u8>().is_ok()))
}

fn file_path(text: &str) -> Option<String> {
    PATH_TOKEN.captures(text).map(|caps| caps[1].to_string())
}

/// Accepts `pid<digits>` and `pid:<digits>`. A value that overflows u32 is
/// treated as an unrecognized token and the field stays absent.
fn process_id(text: &str) -> Option<u32> {
    PID_TOKEN
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

/// Turn one raw line into a record or a rejection reason.
///
/// A record is only materialized when a `ts:<digits>` (or `[ts:<digits>]`)
/// token is present and parses as a non-negative integer. All other fields
/// may appear in any order and are independently optional.
pub fn extract(line: &RawLine) -> Result<LogRecord, ParseFailure> {
    let token = timestamp_token(&line.text).ok_or(ParseFailure {
        source_line: line.number,
        reason: FailureReason::MissingTimestamp,
    })?;

    let timestamp = token
        .parse::<i64>()
        .ok()
        .filter(|ts| *ts >= 0)
        .ok_or(ParseFailure {
            source_line: line.number,
            reason: FailureReason::MalformedTimestamp,
        })?;

    Ok(LogRecord {
        timestamp,
        event_type: event_type(&line.text),
        username: username(&line.text),
        ip_address: ip_address(&line.text),
        file_path: file_path(&line.text),
        process_id: process_id(&line.text),
        source_line: line.number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawLine {
        RawLine::new(text, 1)
    }

    #[test]
    fn test_full_line() {
        let line = raw("[ts:1719835600] EVNT:XR-ACCESS usr:john IP:192.168.1.100 =>/home/docs/file1.txt pid4567");
        let record = extract(&line).expect("line with timestamp extracts");
        assert_eq!(record.timestamp, 1_719_835_600);
        assert_eq!(record.event_type.as_deref(), Some("XR-ACCESS"));
        assert_eq!(record.username.as_deref(), Some("john"));
        assert_eq!(record.ip_address.as_deref(), Some("192.168.1.100"));
        assert_eq!(record.file_path.as_deref(), Some("/home/docs/file1.txt"));
        assert_eq!(record.process_id, Some(4567));
        assert_eq!(record.source_line, 1);
    }

    #[test]
    fn test_unbracketed_timestamp() {
        let record = extract(&raw("ts:42 EVNT:BOOT")).expect("bare ts token extracts");
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.event_type.as_deref(), Some("BOOT"));
    }

    #[test]
    fn test_missing_timestamp() {
        let failure = extract(&raw("EVNT:XR-ACCESS usr:john")).expect_err("no ts token");
        assert_eq!(failure.reason, FailureReason::MissingTimestamp);
        assert_eq!(failure.source_line, 1);
    }

    #[test]
    fn test_malformed_timestamp() {
        for text in ["[ts:notanumber] usr:john", "ts: usr:john", "ts:-5", "ts:99999999999999999999999"] {
            let failure = extract(&raw(text)).expect_err("ts token present but unusable");
            assert_eq!(failure.reason, FailureReason::MalformedTimestamp, "input: {text}");
        }
    }

    #[test]
    fn test_fields_in_any_order() {
        let record = extract(&raw("usr:alice pid:88 ts:100")).expect("order does not matter");
        assert_eq!(record.timestamp, 100);
        assert_eq!(record.username.as_deref(), Some("alice"));
        assert_eq!(record.process_id, Some(88));
        assert_eq!(record.event_type, None);
    }

    #[test]
    fn test_absent_fields_are_none() {
        let record = extract(&raw("[ts:5]")).expect("timestamp alone is enough");
        assert_eq!(record.event_type, None);
        assert_eq!(record.username, None);
        assert_eq!(record.ip_address, None);
        assert_eq!(record.file_path, None);
        assert_eq!(record.process_id, None);
    }

    #[test]
    fn test_unrecognized_tokens_ignored() {
        let record = extract(&raw("garbage [ts:7] ???:: more-garbage")).expect("tolerant of noise");
        assert_eq!(record.timestamp, 7);
    }

    #[test]
    fn test_duplicate_tokens_first_match_wins() {
        let record = extract(&raw("ts:10 usr:first usr:second EVNT:A EVNT:B")).expect("extracts");
        assert_eq!(record.timestamp, 10);
        assert_eq!(record.username.as_deref(), Some("first"));
        assert_eq!(record.event_type.as_deref(), Some("A"));
    }

    #[test]
    fn test_out_of_range_octets_rejected() {
        let record = extract(&raw("ts:10 IP:300.1.2.3")).expect("extracts");
        assert_eq!(record.ip_address, None);

        // A later valid candidate is still found
        let record = extract(&raw("ts:10 999.999.1.1 10.0.0.1")).expect("extracts");
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_pid_both_forms() {
        let record = extract(&raw("ts:10 pid123")).expect("extracts");
        assert_eq!(record.process_id, Some(123));
        let record = extract(&raw("ts:10 pid:456")).expect("extracts");
        assert_eq!(record.process_id, Some(456));
    }

    #[test]
    fn test_pid_overflow_is_absent() {
        let record = extract(&raw("ts:10 pid99999999999")).expect("extracts");
        assert_eq!(record.process_id, None);
    }

    #[test]
    fn test_path_stops_at_whitespace() {
        let record = extract(&raw("ts:10 =>/var/log/app.log trailing words")).expect("extracts");
        assert_eq!(record.file_path.as_deref(), Some("/var/log/app.log"));
    }
}
