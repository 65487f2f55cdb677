use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use crate::utils::pretty_display::{get_indent, PrettyDisplay};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    pub items: Vec<SelectionItem>,
}

impl SelectionSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Display for SelectionSet {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        if self.items.is_empty() {
            return Ok(());
        }

        write!(f, "{{")?;
        for item in &self.items {
            write!(f, " {}", item)?;
        }
        write!(f, " }}")
    }
}

impl PrettyDisplay for SelectionSet {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        for item in &self.items {
            item.pretty_fmt(f, depth)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionItem {
    Field(FieldSelection),
    InlineFragment(InlineFragmentSelection),
}

impl SelectionItem {
    pub fn selections(&self) -> &SelectionSet {
        match self {
            SelectionItem::Field(field) => &field.selections,
            SelectionItem::InlineFragment(fragment) => &fragment.selections,
        }
    }
}

impl Display for SelectionItem {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        match self {
            SelectionItem::Field(field) => write!(f, "{}", field),
            SelectionItem::InlineFragment(fragment) => write!(f, "{}", fragment),
        }
    }
}

impl PrettyDisplay for SelectionItem {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        match self {
            SelectionItem::Field(field) => field.pretty_fmt(f, depth),
            SelectionItem::InlineFragment(fragment) => fragment.pretty_fmt(f, depth),
        }
    }
}

/// A rendered field reference. Each argument is bound to the variable of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<String>,
    pub selections: SelectionSet,
}

impl FieldSelection {
    pub fn is_leaf(&self) -> bool {
        self.selections.is_empty()
    }

    fn write_head(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        if let Some(alias) = &self.alias {
            write!(f, "{}: ", alias)?;
        }
        write!(f, "{}", self.name)?;

        if !self.arguments.is_empty() {
            let arguments = self
                .arguments
                .iter()
                .map(|name| format!("{name}: ${name}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "({})", arguments)?;
        }

        Ok(())
    }
}

impl Display for FieldSelection {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.write_head(f)?;
        if !self.selections.is_empty() {
            write!(f, " {}", self.selections)?;
        }
        Ok(())
    }
}

impl PrettyDisplay for FieldSelection {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        write!(f, "{indent}")?;
        self.write_head(f)?;

        if self.selections.is_empty() {
            return writeln!(f);
        }

        writeln!(f, " {{")?;
        self.selections.pretty_fmt(f, depth + 1)?;
        writeln!(f, "{indent}}}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFragmentSelection {
    pub type_condition: String,
    pub selections: SelectionSet,
}

impl Display for InlineFragmentSelection {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        write!(f, "... on {} {}", self.type_condition, self.selections)
    }
}

impl PrettyDisplay for InlineFragmentSelection {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}... on {} {{", self.type_condition)?;
        self.selections.pretty_fmt(f, depth + 1)?;
        writeln!(f, "{indent}}}")
    }
}
