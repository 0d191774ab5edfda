//! Minimal INI reader for rule and auth files.
//!
//! Follows the conventions of the files ghia consumes:
//! - `[section]` headers
//! - `key=value` or `key: value` entries, keys case-preserving
//! - indented lines continue the previous value (one value line each)
//! - full-line `#` and `;` comments, blank lines ignored
//!
//! Every value line keeps its source line number so later validation can
//! point at the exact offending rule.

use crate::error::{CoreError, Result};

/// A parsed INI document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

/// A `[section]` and its entries in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub line: usize,
    pub entries: Vec<Entry>,
}

/// A single key with its (possibly multi-line) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub line: usize,
    pub lines: Vec<ValueLine>,
}

/// One line of a value with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLine {
    pub line: usize,
    pub text: String,
}

impl Entry {
    /// The value with continuation lines joined by `\n`.
    #[must_use]
    pub fn value(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Non-empty value lines.
    pub fn value_lines(&self) -> impl Iterator<Item = &ValueLine> {
        self.lines.iter().filter(|l| !l.text.is_empty())
    }
}

impl Section {
    /// Last entry with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| e.key == key)
    }
}

impl Document {
    /// Parse INI text.
    ///
    /// # Errors
    /// Returns [`CoreError::Syntax`] for entries outside a section, unterminated
    /// headers, or lines that are neither a key nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = Self::default();
        // Indentation of the key that owns the current value, if any.
        let mut open_indent: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = raw.len() - raw.trim_start().len();

            if let Some(key_indent) = open_indent {
                if indent > key_indent {
                    if let Some(entry) = doc.last_entry_mut() {
                        entry.lines.push(ValueLine {
                            line: line_no,
                            text: trimmed.to_string(),
                        });
                        continue;
                    }
                }
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest.strip_suffix(']').ok_or_else(|| CoreError::Syntax {
                    line: line_no,
                    message: format!("unterminated section header '{trimmed}'"),
                })?;
                doc.open_section(name.trim(), line_no);
                open_indent = None;
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                return Err(CoreError::Syntax {
                    line: line_no,
                    message: "entry before any section header".to_string(),
                });
            };

            let split = trimmed
                .find(['=', ':'])
                .ok_or_else(|| CoreError::Syntax {
                    line: line_no,
                    message: format!("expected 'key=value', found '{trimmed}'"),
                })?;
            let key = trimmed[..split].trim();
            if key.is_empty() {
                return Err(CoreError::Syntax {
                    line: line_no,
                    message: "empty key".to_string(),
                });
            }
            let value = trimmed[split + 1..].trim();

            section.entries.push(Entry {
                key: key.to_string(),
                line: line_no,
                lines: vec![ValueLine {
                    line: line_no,
                    text: value.to_string(),
                }],
            });
            open_indent = Some(indent);
        }

        Ok(doc)
    }

    /// Look up a section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Value of `key` in `section`, if both exist.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.section(section)
            .and_then(|s| s.get(key))
            .map(Entry::value)
    }

    /// All sections in file order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    // Repeated headers reopen the earlier section.
    fn open_section(&mut self, name: &str, line: usize) {
        if let Some(pos) = self.sections.iter().position(|s| s.name == name) {
            let section = self.sections.remove(pos);
            self.sections.push(section);
        } else {
            self.sections.push(Section {
                name: name.to_string(),
                line,
                entries: Vec::new(),
            });
        }
    }

    fn last_entry_mut(&mut self) -> Option<&mut Entry> {
        self.sections.last_mut().and_then(|s| s.entries.last_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULES: &str = "\
[patterns]
ghia-anna=
    title:network
    text:protocol

# comment
ghia-jane: label:bug
[fallback]
label=Need assignment
";

    #[test]
    fn test_parse_sections_and_continuations() {
        let doc = Document::parse(RULES).unwrap();

        let patterns = doc.section("patterns").unwrap();
        assert_eq!(patterns.entries.len(), 2);

        let anna = patterns.get("ghia-anna").unwrap();
        assert_eq!(anna.value(), "\ntitle:network\ntext:protocol");
        let lines: Vec<usize> = anna.value_lines().map(|l| l.line).collect();
        assert_eq!(lines, vec![3, 4]);

        let jane = patterns.get("ghia-jane").unwrap();
        assert_eq!(jane.value(), "label:bug");

        assert_eq!(doc.get("fallback", "label").as_deref(), Some("Need assignment"));
    }

    #[test]
    fn test_keys_preserve_case() {
        let doc = Document::parse("[github]\nToken=abc\n").unwrap();
        assert!(doc.get("github", "Token").is_some());
        assert!(doc.get("github", "token").is_none());
    }

    #[test]
    fn test_entry_before_section_is_error() {
        let err = Document::parse("token=abc\n").unwrap_err();
        assert!(matches!(err, CoreError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_unterminated_header_is_error() {
        let err = Document::parse("[github\n").unwrap_err();
        assert!(matches!(err, CoreError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_line_without_separator_is_error() {
        let err = Document::parse("[github]\njust words\n").unwrap_err();
        assert!(matches!(err, CoreError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_repeated_section_reopens() {
        let doc = Document::parse("[a]\nx=1\n[b]\ny=2\n[a]\nz=3\n").unwrap();
        assert_eq!(doc.sections().len(), 2);
        assert_eq!(doc.section("a").unwrap().entries.len(), 2);
    }
}
