//! INI file configuration adapter.
//!
//! Also serves stocksets: `[stocksets]` maps a set name to a comma-separated
//! code list, and `[holdings.<owner>]` maps holding-list ids to code lists.
//! Section and key names are case-insensitive.

use crate::domain::error::ScreenerError;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use crate::ports::stockset_port::StocksetPort;
use configparser::ini::Ini;
use std::path::Path;

const STOCKSETS: &str = "stocksets";
const HOLDINGS: &str = "holdings.";

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ScreenerError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScreenerError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScreenerError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    fn code_list(&self, section: &str, key: &str) -> Result<Option<Vec<String>>, ScreenerError> {
        let key = key.trim().to_lowercase();
        match self.config.get(section, &key) {
            None => Ok(None),
            Some(raw) => parse_codes(&raw)
                .map(Some)
                .map_err(|e| ScreenerError::ConfigInvalid {
                    section: section.to_string(),
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(section)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

impl StocksetPort for FileConfigAdapter {
    fn named_stockset(&self, name: &str) -> Result<Option<Vec<String>>, ScreenerError> {
        self.code_list(STOCKSETS, name)
    }

    fn holdings(&self, owner: &str, id: &str) -> Result<Option<Vec<String>>, ScreenerError> {
        let section = format!("{HOLDINGS}{}", owner.trim().to_lowercase());
        self.code_list(&section, id)
    }

    fn list_stocksets(&self, owner: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = self
            .section_keys(STOCKSETS)
            .into_iter()
            .map(|k| k.to_uppercase())
            .collect();
        if let Some(owner) = owner {
            let section = format!("{HOLDINGS}{}", owner.trim().to_lowercase());
            names.extend(self.section_keys(&section).into_iter().map(|id| format!("holdings:{id}")));
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = csv
csv_dir = ./data
history_days = 365

[profile]
workers = 4
price_tolerance_days = 3
search_forward = yes

[stocksets]
ASX5 = BHP, CBA, CSL, NAB, WBC
Banks = cba,nab
Broken = BHP,,CBA

[holdings.alice]
core = BHP,CSL
"#;

    fn sample() -> FileConfigAdapter {
        FileConfigAdapter::from_string(SAMPLE).unwrap()
    }

    #[test]
    fn typed_getters() {
        let adapter = sample();
        assert_eq!(adapter.get_string("data", "source"), Some("csv".to_string()));
        assert_eq!(adapter.get_int("data", "history_days", 0), 365);
        assert_eq!(adapter.get_int("data", "missing", 42), 42);
        assert_eq!(adapter.get_double("profile", "workers", 0.0), 4.0);
        assert!(adapter.get_bool("profile", "search_forward", false));
        assert!(adapter.get_bool("profile", "missing", true));
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn non_numeric_falls_back_to_default() {
        let adapter = FileConfigAdapter::from_string("[profile]\nworkers = abc\n").unwrap();
        assert_eq!(adapter.get_int("profile", "workers", 2), 2);
        assert_eq!(adapter.get_double("profile", "workers", 9.5), 9.5);
    }

    #[test]
    fn named_stocksets_are_case_insensitive() {
        let adapter = sample();
        assert_eq!(
            adapter.named_stockset("asx5").unwrap().unwrap(),
            vec!["BHP", "CBA", "CSL", "NAB", "WBC"]
        );
        assert_eq!(adapter.named_stockset("BANKS").unwrap().unwrap(), vec!["CBA", "NAB"]);
        assert_eq!(adapter.named_stockset("nope").unwrap(), None);
    }

    #[test]
    fn malformed_code_list_is_config_error() {
        let adapter = sample();
        assert!(matches!(
            adapter.named_stockset("broken"),
            Err(ScreenerError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn holdings_by_owner() {
        let adapter = sample();
        assert_eq!(adapter.holdings("Alice", "core").unwrap().unwrap(), vec!["BHP", "CSL"]);
        assert_eq!(adapter.holdings("bob", "core").unwrap(), None);
    }

    #[test]
    fn lists_stocksets() {
        let adapter = sample();
        assert_eq!(adapter.list_stocksets(None), vec!["ASX5", "BANKS", "BROKEN"]);
        assert!(adapter
            .list_stocksets(Some("alice"))
            .contains(&"holdings:core".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\ncsv_dir = /tmp/prices\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("data", "csv_dir"), Some("/tmp/prices".to_string()));
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ScreenerError::ConfigParse { .. })));
    }
}
