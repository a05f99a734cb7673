//! Engine-side reading of configuration strings.
//!
//! Configuration reaches the engine as opaque text of the form
//! `key=value,flag,nested=(a=1,b=2)`. Only the engine interprets it.

/// A parsed configuration string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigReader {
    entries: Vec<(String, String)>,
}

impl ConfigReader {
    /// Parses a configuration string. `None` yields an empty configuration.
    ///
    /// Items are separated by top-level commas. A bare item is a flag with
    /// value `true`. Later items override earlier ones.
    #[must_use]
    pub fn parse(config: Option<&str>) -> Self {
        let mut entries = Vec::new();
        let Some(config) = config else {
            return Self { entries };
        };

        for item in split_top_level(config) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (key, value) = match find_top_level(item, '=') {
                Some(idx) => (item[..idx].trim(), item[idx + 1..].trim()),
                None => (item, "true"),
            };
            entries.push((key.to_string(), unquote(value).to_string()));
        }

        Self { entries }
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a boolean setting, or `default` when absent or unparseable.
    #[must_use]
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some("true" | "1" | "on") => true,
            Some("false" | "0" | "off") => false,
            _ => default,
        }
    }

    /// Returns a byte-size setting such as `cache_size=10MB`.
    #[must_use]
    pub fn size(&self, key: &str) -> Option<u64> {
        parse_size(self.get(key)?)
    }

    /// Returns true if no items were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn find_top_level(s: &str, needle: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c == needle && depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

fn parse_size(s: &str) -> Option<u64> {
    let digits_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);
    let number: u64 = s[..digits_end].parse().ok()?;
    let multiplier: u64 = match s[digits_end..].trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1 << 10,
        "M" | "MB" => 1 << 20,
        "G" | "GB" => 1 << 30,
        "T" | "TB" => 1 << 40,
        _ => return None,
    };
    number.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_empty() {
        let cfg = ConfigReader::parse(None);
        assert!(cfg.is_empty());
        assert!(cfg.get("create").is_none());
    }

    #[test]
    fn flags_and_values() {
        let cfg = ConfigReader::parse(Some("create, cache_size=1MB,overwrite=false"));
        assert!(cfg.flag("create", false));
        assert!(!cfg.flag("overwrite", true));
        assert_eq!(cfg.size("cache_size"), Some(1 << 20));
        assert!(cfg.flag("missing", true));
    }

    #[test]
    fn nested_groups_stay_together() {
        let cfg = ConfigReader::parse(Some("log=(enabled=true,path=logs),create"));
        assert_eq!(cfg.get("log"), Some("(enabled=true,path=logs)"));
        assert!(cfg.flag("create", false));
    }

    #[test]
    fn later_items_override() {
        let cfg = ConfigReader::parse(Some("overwrite=true,overwrite=false"));
        assert!(!cfg.flag("overwrite", true));
    }

    #[test]
    fn quoted_values() {
        let cfg = ConfigReader::parse(Some("name=\"x,y\""));
        // Quotes do not protect commas; the engine does not use quoted lists.
        assert_eq!(cfg.get("name"), Some("\"x"));
        let cfg = ConfigReader::parse(Some("name=\"xy\""));
        assert_eq!(cfg.get("name"), Some("xy"));
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("4KB"), Some(4096));
        assert_eq!(parse_size("2gb"), Some(2 << 30));
        assert_eq!(parse_size("abc"), None);
        assert_eq!(parse_size("10XB"), None);
    }
}
