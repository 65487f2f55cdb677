use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

pub fn get_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

pub trait PrettyDisplay {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult;
}

/// Adapts any [`PrettyDisplay`] value to `Display`, starting at depth zero.
pub struct Pretty<'a, T: PrettyDisplay>(pub &'a T);

impl<T: PrettyDisplay> Display for Pretty<'_, T> {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.0.pretty_fmt(f, 0)
    }
}
