//! Line-oriented readers for host pseudo-files (`/proc/*`, sysfs attributes,
//! storage appliance INI files). Parsers skip malformed lines and keep going.

use crate::error::{MetricError, MetricResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub fn read_to_string(path: &Path) -> MetricResult<String> {
    fs::read_to_string(path).map_err(|e| MetricError::from_io(&path.display().to_string(), &e))
}

pub fn read_lines(path: &Path) -> MetricResult<Vec<String>> {
    Ok(read_to_string(path)?.lines().map(str::to_owned).collect())
}

/// Single-value attribute such as `/sys/class/net/eth0/mtu`.
pub fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// `Key: value` lines (`/proc/meminfo`, `/proc/cpuinfo`). Later duplicates
/// do not overwrite earlier ones, so on cpuinfo the first processor wins.
pub fn parse_colon_pairs<'a, I>(lines: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = HashMap::new();
    for line in lines {
        let Some((k, v)) = line.split_once(':') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        out.entry(k.to_string()).or_insert_with(|| v.trim().to_string());
    }
    out
}

/// One `[section]` of an INI file with its `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub entries: HashMap<String, String>,
}

impl IniSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Sections in file order. Values lose surrounding whitespace and double
/// quotes; pairs before the first section header are dropped.
pub fn parse_ini<'a, I>(lines: I) -> Vec<IniSection>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sections: Vec<IniSection> = Vec::new();
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
            sections.push(IniSection {
                name: line[1..line.len() - 1].to_string(),
                entries: HashMap::new(),
            });
            continue;
        }
        let (Some(section), Some((k, v))) = (sections.last_mut(), line.split_once('=')) else {
            continue;
        };
        section
            .entries
            .insert(k.trim().to_string(), v.trim().trim_matches('"').to_string());
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini_tolerates_noise() {
        let text = "orphan=1\n\n[disk1]\nname=\"disk1\"\ntemp=\"38\"\ngarbage line\n[cache]\ntemp=\"*\"\n";
        let s = parse_ini(text.lines());
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].name, "disk1");
        assert_eq!(s[0].get("temp"), Some("38"));
        assert_eq!(s[0].get("name"), Some("disk1"));
        assert_eq!(s[1].get("temp"), Some("*"));
    }

    #[test]
    fn colon_pairs_keep_first() {
        let text = "model name\t: A\nbogus\nmodel name\t: B\n";
        let m = parse_colon_pairs(text.lines());
        assert_eq!(m.get("model name").map(String::as_str), Some("A"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let r = read_lines(Path::new("/definitely/not/here/meminfo"));
        assert!(matches!(r, Err(MetricError::NotFound(_))));
    }
}
