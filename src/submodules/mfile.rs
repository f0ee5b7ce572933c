use std::{collections::HashMap, path::Path, sync::LazyLock};

use regex::Regex;

use super::{error::{IoContext, ScanResult}, type_lib::NumericData};

static NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(([^()\s]+)\)_*$").unwrap());
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\(([^()]*)\)_*$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum MFileValue {
    Number(NumericData),
    Text(String),
}

impl MFileValue {
    pub fn parse(token: &str) -> Self {
        let unquoted = token.trim_matches('"');
        if let Ok(number) = unquoted.parse::<NumericData>() {
            return MFileValue::Number(number);
        }
        // Fortran double-precision exponent
        if let Ok(number) = unquoted.replacen(['D', 'd'], "E", 1).parse::<NumericData>() {
            return MFileValue::Number(number);
        }
        MFileValue::Text(unquoted.to_string())
    }

    pub fn as_number(&self) -> Option<NumericData> {
        match self {
            MFileValue::Number(number) => Some(*number),
            MFileValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MFileVariable {
    pub name: String,
    pub description: String,
    pub unit: Option<String>,
    pub flag: Option<String>,
    pub scans: Vec<MFileValue>,
}

impl MFileVariable {
    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    /// Negative indices count from the last scan, `-1` being the latest.
    pub fn scan(&self, index: isize) -> Option<&MFileValue> {
        let resolved = if index < 0 { self.scans.len().checked_sub(index.unsigned_abs())? } else { index as usize };
        self.scans.get(resolved)
    }

    pub fn last_number(&self) -> Option<NumericData> {
        self.scan(-1).and_then(MFileValue::as_number)
    }
}

/// The subset of the solver's MFILE.DAT output needed to collect a scan.
#[derive(Debug, Clone, Default)]
pub struct MFile {
    pub data: HashMap<String, MFileVariable>,
}

struct MFileLine<'a> {
    description: String,
    name: &'a str,
    value: &'a str,
    flag: Option<&'a str>,
}

fn parse_line(line: &str) -> Option<MFileLine<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let name_index = tokens.iter().rposition(|token| NAME_TOKEN.is_match(token))?;
    let value = *tokens.get(name_index + 1)?;
    let name = NAME_TOKEN.captures(tokens[name_index])?.get(1)?.as_str();
    Some(MFileLine {
        description: tokens[..name_index].join(" "),
        name,
        value,
        flag: tokens.get(name_index + 2).copied(),
    })
}

impl MFile {
    pub fn parse(text: &str) -> Self {
        let mut mfile = MFile::default();
        for line in text.lines().filter_map(parse_line) {
            let value = MFileValue::parse(line.value);
            match mfile.data.get_mut(line.name) {
                Some(variable) => variable.scans.push(value),
                None => {
                    let unit = UNIT_SUFFIX.captures(&line.description).and_then(|caps| caps.get(1)).map(|unit| unit.as_str().to_string());
                    mfile.data.insert(line.name.to_string(), MFileVariable {
                        name: line.name.to_string(),
                        description: line.description,
                        unit,
                        flag: line.flag.map(str::to_string),
                        scans: vec![value],
                    });
                }
            }
        }
        mfile
    }

    pub fn read(path: &Path) -> ScanResult<Self> {
        let text = std::fs::read_to_string(path).at(path)?;
        Ok(MFile::parse(&text))
    }

    pub fn get(&self, name: &str) -> Option<&MFileVariable> {
        self.data.get(name)
    }
}
