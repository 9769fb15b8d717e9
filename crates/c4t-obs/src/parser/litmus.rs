use super::line::parse_histogram_line;
use super::{Dialect, ErrorKind, StateLine};
use crate::{Flag, TestType};

/// Litmus7 output.
///
/// Litmus7 announces `Histogram (N states)` and prints one histogram line per
/// state: an occurrence count, a `*` or `:` sigil, `>`, then the values.
#[derive(Clone, Copy, Debug, Default)]
pub struct Litmus;

impl Dialect for Litmus {
    fn parse_state_count(&self, fields: &[&str]) -> Result<Option<usize>, ErrorKind> {
        match fields {
            ["Histogram", count, "states)" | "state)"] => count
                .strip_prefix('(')
                .ok_or_else(|| ErrorKind::BadStateCount(format!("missing '(' in {count:?}")))?
                .parse()
                .map(Some)
                .map_err(|e| ErrorKind::BadStateCount(format!("{count:?}: {e}"))),
            ["Histogram", ..] => Err(ErrorKind::BadStateCount(fields.join(" "))),
            _ => Ok(None),
        }
    }

    fn parse_state_line<'l>(
        &self,
        test_type: TestType,
        line: &'l str,
    ) -> Result<StateLine<'l>, ErrorKind> {
        parse_histogram_line(test_type, line).unwrap_or_else(|| {
            Err(ErrorKind::BadStateLine(
                "expected <count> <sigil>> values".to_string(),
            ))
        })
    }

    fn parse_pre_test_line(&self, _line: &str) -> Flag {
        Flag::NONE
    }
}
