//! Section-keyed configuration documents.
//!
//! A [`Document`] maps configuration sections (literal menu paths such as
//! `/ip firewall mangle`) to ordered lists of rendered statements. Order
//! is semantically significant: distance ladders and marking passes depend
//! on insertion sequence, so merging appends and never deduplicates or
//! reorders.

use crate::statement::Statement;

/// A device configuration section, identified by its literal menu path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `/ip firewall mangle`
    Mangle,
    /// `/ip route`
    Route,
    /// `/interface bonding`
    Bonding,
    /// `/system script`
    Script,
    /// `/system scheduler`
    Scheduler,
}

impl Section {
    /// The literal configuration path for this section.
    pub fn path(self) -> &'static str {
        match self {
            Self::Mangle => "/ip firewall mangle",
            Self::Route => "/ip route",
            Self::Bonding => "/interface bonding",
            Self::Script => "/system script",
            Self::Scheduler => "/system scheduler",
        }
    }
}

/// An ordered, section-keyed set of configuration statements.
///
/// Composers return freshly allocated documents; the assembler merges them
/// in call order. The first statement pushed to a section fixes that
/// section's position in the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<(Section, Vec<String>)>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement to a section, creating the section on first use.
    pub fn push(&mut self, section: Section, statement: Statement) {
        self.entry(section).push(statement.render());
    }

    /// Append another document, preserving both call order and each
    /// document's internal order. Statements are never deduplicated:
    /// repeated statements can be semantically meaningful.
    pub fn merge(&mut self, other: Document) {
        for (section, statements) in other.sections {
            self.entry(section).extend(statements);
        }
    }

    /// Merge any number of composer outputs in call order.
    pub fn assemble(parts: impl IntoIterator<Item = Document>) -> Document {
        let mut merged = Document::new();
        for part in parts {
            merged.merge(part);
        }
        merged
    }

    /// Iterate sections in insertion order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, &[String])> {
        self.sections
            .iter()
            .map(|(section, statements)| (*section, statements.as_slice()))
    }

    /// Get the statements for a section (empty if the section is absent).
    pub fn statements(&self, section: Section) -> &[String] {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, statements)| statements.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the document contains no statements at all.
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|(_, statements)| statements.is_empty())
    }

    /// Render the document as an exportable script: each section's menu
    /// path followed by its statements, sections separated by a blank line.
    pub fn to_script(&self) -> String {
        let mut out = String::new();
        for (section, statements) in &self.sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(section.path());
            out.push('\n');
            for statement in statements {
                out.push_str(statement);
                out.push('\n');
            }
        }
        out
    }

    fn entry(&mut self, section: Section) -> &mut Vec<String> {
        let index = match self.sections.iter().position(|(s, _)| *s == section) {
            Some(index) => index,
            None => {
                self.sections.push((section, Vec::new()));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }
}

#[cfg(feature = "output")]
impl serde::Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (section, statements) in &self.sections {
            map.serialize_entry(section.path(), statements)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(gateway: &str) -> Statement {
        Statement::add()
            .arg("dst-address", "0.0.0.0/0")
            .arg("gateway", gateway)
    }

    #[test]
    fn test_push_creates_section_once() {
        let mut doc = Document::new();
        doc.push(Section::Route, route("10.0.0.1"));
        doc.push(Section::Route, route("10.0.0.2"));
        assert_eq!(doc.statements(Section::Route).len(), 2);
        assert_eq!(doc.sections().count(), 1);
    }

    #[test]
    fn test_merge_appends_per_key() {
        let mut first = Document::new();
        first.push(Section::Route, route("10.0.0.1"));
        let mut second = Document::new();
        second.push(Section::Route, route("10.0.0.2"));
        second.push(Section::Mangle, Statement::add().arg("chain", "input"));

        first.merge(second);
        let routes = first.statements(Section::Route);
        assert!(routes[0].contains("10.0.0.1"));
        assert!(routes[1].contains("10.0.0.2"));
        assert_eq!(first.statements(Section::Mangle).len(), 1);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let mut first = Document::new();
        first.push(Section::Route, route("10.0.0.1"));
        let mut second = Document::new();
        second.push(Section::Route, route("10.0.0.1"));
        first.merge(second);
        assert_eq!(first.statements(Section::Route).len(), 2);
    }

    #[test]
    fn test_section_order_is_first_insertion() {
        let mut doc = Document::new();
        doc.push(Section::Script, Statement::add().quoted("name", "s"));
        doc.push(Section::Route, route("10.0.0.1"));
        let order: Vec<_> = doc.sections().map(|(s, _)| s).collect();
        assert_eq!(order, vec![Section::Script, Section::Route]);
    }

    #[test]
    fn test_to_script_layout() {
        let mut doc = Document::new();
        doc.push(Section::Route, route("10.0.0.1"));
        doc.push(Section::Mangle, Statement::add().arg("chain", "input"));
        assert_eq!(
            doc.to_script(),
            "/ip route\nadd dst-address=0.0.0.0/0 gateway=10.0.0.1\n\n/ip firewall mangle\nadd chain=input\n"
        );
    }

    #[test]
    fn test_missing_section_is_empty() {
        let doc = Document::new();
        assert!(doc.statements(Section::Scheduler).is_empty());
        assert!(doc.is_empty());
    }
}
