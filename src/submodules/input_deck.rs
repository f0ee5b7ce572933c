use std::path::Path;

use super::{error::{IoContext, ScanResult}, type_lib::NumericData};

/// Solver input deck: `key = value` lines, `*` comments, kept line by line so
/// untouched lines are written back verbatim.
#[derive(Debug, Clone)]
pub struct InputDeck {
    pub lines: Vec<String>,
}

impl InputDeck {
    pub fn parse(text: &str) -> Self {
        InputDeck { lines: text.lines().map(str::to_string).collect() }
    }

    pub fn read(path: &Path) -> ScanResult<Self> {
        let text = std::fs::read_to_string(path).at(path)?;
        Ok(InputDeck::parse(&text))
    }

    pub fn write(&self, path: &Path) -> ScanResult<()> {
        let mut text = self.lines.join("\n");
        text.push('\n');
        std::fs::write(path, text).at(path)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match split_assignment(line) {
            Some((k, value, _)) if k == key => Some(value),
            _ => None,
        })
    }

    /// Replaces the first assignment to `key`, appending one if there is none.
    /// Returns `true` when an existing line was replaced.
    pub fn set_value(&mut self, key: &str, value: NumericData) -> bool {
        let rendered = format_deck_value(value);
        for line in self.lines.iter_mut() {
            let replacement = match split_assignment(line) {
                Some((k, _, comment)) if k == key => match comment {
                    Some(comment) => format!("{} = {} {}", key, rendered, comment),
                    None => format!("{} = {}", key, rendered),
                },
                _ => continue,
            };
            *line = replacement;
            return true;
        }
        self.lines.push(format!("{} = {}", key, rendered));
        false
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str, Option<&str>)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('*') {
        return None;
    }
    let (key, rest) = trimmed.split_once('=')?;
    let (value, comment) = match rest.find('*') {
        Some(idx) => (&rest[..idx], Some(rest[idx..].trim_end())),
        None => (rest, None),
    };
    Some((key.trim(), value.trim(), comment))
}

pub fn format_deck_value(value: NumericData) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
*--------- Geometry ---------*
rmajor = 22.0 * plasma major radius
f_st_coil_aspect = 1.0 * coil aspect scaling

* b_plasma_toroidal_on_axis = 3.0
b_plasma_toroidal_on_axis = 5.6";

    #[test]
    fn replaces_value_and_keeps_comment() {
        let mut deck = InputDeck::parse(DECK);
        assert!(deck.set_value("f_st_coil_aspect", 0.85));
        assert_eq!(deck.lines[2], "f_st_coil_aspect = 0.85 * coil aspect scaling");
        assert_eq!(deck.lines[1], "rmajor = 22.0 * plasma major radius");
        assert_eq!(deck.lines.len(), 6);
    }

    #[test]
    fn commented_assignment_is_ignored() {
        let mut deck = InputDeck::parse(DECK);
        assert!(deck.set_value("b_plasma_toroidal_on_axis", 6.25));
        assert_eq!(deck.lines[4], "* b_plasma_toroidal_on_axis = 3.0");
        assert_eq!(deck.lines[5], "b_plasma_toroidal_on_axis = 6.25");
        assert_eq!(deck.get("b_plasma_toroidal_on_axis"), Some("6.25"));
    }

    #[test]
    fn missing_key_is_appended() {
        let mut deck = InputDeck::parse(DECK);
        assert!(!deck.set_value("hfact", 1.2));
        assert_eq!(deck.lines.last().map(String::as_str), Some("hfact = 1.2"));
    }

    #[test]
    fn key_match_is_exact() {
        let mut deck = InputDeck::parse("coil_aspect = 2.0\nf_st_coil_aspect = 1.0");
        deck.set_value("coil_aspect", 3.0);
        assert_eq!(deck.get("coil_aspect"), Some("3"));
        assert_eq!(deck.get("f_st_coil_aspect"), Some("1.0"));
    }

    #[test]
    fn write_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squid.IN.DAT");
        let mut deck = InputDeck::parse(DECK);
        deck.set_value("rmajor", 18.5);
        deck.write(&path).unwrap();
        let reread = InputDeck::read(&path).unwrap();
        assert_eq!(reread.get("rmajor"), Some("18.5"));
        assert_eq!(reread.lines, deck.lines);
    }
}
