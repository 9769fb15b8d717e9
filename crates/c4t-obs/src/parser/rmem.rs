use super::line::{parse_herd_state_line, parse_states_count};
use super::{Dialect, ErrorKind, StateLine};
use crate::{Flag, TestType};

/// Rmem output.
///
/// Same state syntax as Herd. Rmem can give up before exploring every
/// execution, which it reports in a banner before the test line.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rmem;

impl Dialect for Rmem {
    fn parse_state_count(&self, fields: &[&str]) -> Result<Option<usize>, ErrorKind> {
        parse_states_count(fields)
    }

    fn parse_state_line<'l>(
        &self,
        test_type: TestType,
        line: &'l str,
    ) -> Result<StateLine<'l>, ErrorKind> {
        parse_herd_state_line(test_type, line)
    }

    fn parse_pre_test_line(&self, line: &str) -> Flag {
        let lower = line.to_ascii_lowercase();
        let timed_out = line
            .split_whitespace()
            .next()
            .is_some_and(|first| first.trim_end_matches(':') == "Timeout");
        if timed_out || lower.contains("not exhaustive") {
            Flag::PARTIAL
        } else {
            Flag::NONE
        }
    }
}
