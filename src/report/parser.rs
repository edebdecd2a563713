//! Splits generated report text into named sections.
//!
//! A heading is a line whose trimmed form starts with `"# "` followed by a
//! non-empty name. Lines before the first heading are discarded. Blank lines
//! inside a section are dropped and each body is trimmed when committed.
//! Section names outside any known vocabulary are kept.

use std::collections::BTreeMap;

/// Section name to body text.
pub type ReportSections = BTreeMap<String, String>;

const HEADING_MARKER: &str = "# ";

enum ScanState<'a> {
    OutsideSection,
    InsideSection { name: String, buffer: Vec<&'a str> },
}

/// Parse raw report text. Total and deterministic: any input yields a map.
pub fn parse_sections(text: &str) -> ReportSections {
    let mut sections = ReportSections::new();
    let mut state = ScanState::OutsideSection;

    for line in text.lines() {
        if let Some(name) = heading_name(line) {
            if let ScanState::InsideSection { name: open, buffer } = state {
                commit(&mut sections, open, &buffer);
            }
            state = ScanState::InsideSection {
                name: name.to_string(),
                buffer: Vec::new(),
            };
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match &mut state {
            ScanState::OutsideSection => {}
            ScanState::InsideSection { buffer, .. } => buffer.push(line),
        }
    }

    if let ScanState::InsideSection { name, buffer } = state {
        commit(&mut sections, name, &buffer);
    }

    sections
}

fn heading_name(line: &str) -> Option<&str> {
    let name = line.trim().strip_prefix(HEADING_MARKER)?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn commit(sections: &mut ReportSections, name: String, buffer: &[&str]) {
    sections.insert(name, buffer.join("\n").trim().to_string());
}
