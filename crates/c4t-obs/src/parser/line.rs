//! Line-level helpers shared between dialects.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::{ErrorKind, StateLine};
use crate::{Tag, TestType};

/// Parses a run of `name=value;` tokens into a value map.
///
/// The trailing `;` on each token is optional. Each token must have exactly one
/// `=` with a non-empty name and value; names must not repeat.
///
/// # Errors
/// Returns [`ErrorKind::BadStateLine`] for any malformed token, or if there are
/// no tokens at all.
pub fn parse_values(rest: &str) -> Result<BTreeMap<String, String>, ErrorKind> {
    let mut values = BTreeMap::new();

    for token in rest.split_whitespace() {
        let token = token.strip_suffix(';').unwrap_or(token);
        let mut parts = token.split('=');
        let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ErrorKind::BadStateLine(format!(
                "malformed value {token:?}"
            )));
        };

        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            return Err(ErrorKind::BadStateLine(format!(
                "malformed value {token:?}"
            )));
        }
        if values.insert(name.to_string(), value.to_string()).is_some() {
            return Err(ErrorKind::BadStateLine(format!("duplicate variable {name:?}")));
        }
    }

    if values.is_empty() {
        return Err(ErrorKind::BadStateLine("no values".to_string()));
    }
    Ok(values)
}

/// Parses a histogram-style state line: `<count><sigil>><tokens>`.
///
/// Litmus7 prints these as e.g. `2483  *>0:EAX=0; 1:EAX=0;`. Returns `None` if
/// the line doesn't have the histogram shape at all.
pub(super) fn parse_histogram_line(
    test_type: TestType,
    line: &str,
) -> Option<Result<StateLine<'_>, ErrorKind>> {
    let pattern = HISTOGRAM_PATTERN
        .get_or_init(|| Regex::new(r"^\s*(\d+)\s*(\S)>(.*)$").expect("valid histogram regex"));
    let caps = pattern.captures(line)?;

    let count = caps.get(1)?.as_str();
    let sigil = caps.get(2)?.as_str();
    let rest = caps.get(3)?.as_str();

    Some(histogram_parts(test_type, count, sigil).map(|(tag, occurrences)| StateLine {
        tag,
        occurrences,
        rest,
    }))
}

fn histogram_parts(
    test_type: TestType,
    count: &str,
    sigil: &str,
) -> Result<(Tag, u64), ErrorKind> {
    let occurrences = count
        .parse::<u64>()
        .map_err(|e| ErrorKind::BadStateLine(format!("bad occurrence count {count:?}: {e}")))?;
    let tag = sigil
        .chars()
        .next()
        .and_then(|c| test_type.tag_for_sigil(c))
        .ok_or_else(|| ErrorKind::BadStateLine(format!("unknown sigil {sigil:?}")))?;
    Ok((tag, occurrences))
}

/// Parses a `States N` count line, as printed by Herd and Rmem.
/// Herd-style state line: histogram-shaped if it looks like one, otherwise
/// bare `name=value;` tokens with no tag.
pub(super) fn parse_herd_state_line(
    test_type: TestType,
    line: &str,
) -> Result<StateLine<'_>, ErrorKind> {
    parse_histogram_line(test_type, line).unwrap_or(Ok(StateLine {
        tag: Tag::Unknown,
        occurrences: 0,
        rest: line,
    }))
}

pub(super) fn parse_states_count(fields: &[&str]) -> Result<Option<usize>, ErrorKind> {
    match fields {
        ["States", count] => count
            .parse()
            .map(Some)
            .map_err(|e| ErrorKind::BadStateCount(format!("{count:?}: {e}"))),
        ["States", ..] => Err(ErrorKind::BadStateCount(format!(
            "expected 2 fields, got {}",
            fields.len()
        ))),
        _ => Ok(None),
    }
}

static HISTOGRAM_PATTERN: OnceLock<Regex> = OnceLock::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_trim_and_strip() {
        let values = parse_values("0:r0=1; x=2 [y]=3;").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values["0:r0"], "1");
        assert_eq!(values["x"], "2");
        assert_eq!(values["[y]"], "3");
    }

    #[test]
    fn test_values_reject_bad_tokens() {
        assert!(parse_values("x==1;").is_err());
        assert!(parse_values("x=1=2;").is_err());
        assert!(parse_values("x;").is_err());
        assert!(parse_values("=1;").is_err());
        assert!(parse_values("x=;").is_err());
        assert!(parse_values("x=1; x=2;").is_err());
        assert!(parse_values("").is_err());
    }

    #[test]
    fn test_histogram_line() {
        let line = parse_histogram_line(TestType::Allowed, "2483  *>0:EAX=0; 1:EAX=0;")
            .unwrap()
            .unwrap();
        assert_eq!(line.tag, Tag::Witness);
        assert_eq!(line.occurrences, 2483);
        assert_eq!(line.rest, "0:EAX=0; 1:EAX=0;");

        let line = parse_histogram_line(TestType::Allowed, "1:>x=0;").unwrap().unwrap();
        assert_eq!(line.tag, Tag::Counter);
        assert_eq!(line.occurrences, 1);
        assert_eq!(line.rest, "x=0;");
    }

    #[test]
    fn test_histogram_rejects_unknown_sigil() {
        let result = parse_histogram_line(TestType::Allowed, "5 #>x=0;").unwrap();
        assert!(matches!(result, Err(ErrorKind::BadStateLine(_))));
    }

    #[test]
    fn test_plain_line_is_not_histogram() {
        assert!(parse_histogram_line(TestType::Allowed, "0:EAX=0; 1:EAX=1;").is_none());
    }

    #[test]
    fn test_herd_state_line() {
        let plain = parse_herd_state_line(TestType::Allowed, "0:EAX=0; 1:EAX=1;").unwrap();
        assert_eq!(plain.tag, Tag::Unknown);
        assert_eq!(plain.occurrences, 0);
        assert_eq!(plain.rest, "0:EAX=0; 1:EAX=1;");

        let counted = parse_herd_state_line(TestType::Required, "3*>x=1;").unwrap();
        assert_eq!(counted.tag, Tag::Counter);
        assert_eq!(counted.occurrences, 3);

        assert!(parse_herd_state_line(TestType::Allowed, "3?>x=1;").is_err());
    }

    #[test]
    fn test_states_count() {
        assert_eq!(parse_states_count(&["States", "4"]), Ok(Some(4)));
        assert_eq!(parse_states_count(&["Generated", "assembler"]), Ok(None));
        assert!(parse_states_count(&["States", "four"]).is_err());
        assert!(parse_states_count(&["States"]).is_err());
    }
}
