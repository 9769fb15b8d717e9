use super::line::{parse_herd_state_line, parse_states_count};
use super::{Dialect, ErrorKind, StateLine};
use crate::{Flag, TestType};

/// Herd7 output.
///
/// Herd counts states with `States N` and prints each state as bare
/// `name=value;` tokens, without tags. Histogram-shaped lines are also
/// accepted and keep their count and sigil.
#[derive(Clone, Copy, Debug, Default)]
pub struct Herd;

impl Dialect for Herd {
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

    fn parse_pre_test_line(&self, _line: &str) -> Flag {
        Flag::NONE
    }
}
