/// Station (CRS) and operator (TOC) name lookup over bundled tables
use crate::domain::ANY_DESTINATION;
use crate::errors::{ApiError, ApiResult};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

pub const ANY_STATION: &str = "Any Station";
pub const UNKNOWN_STATION: &str = "Unknown station";
pub const UNKNOWN_OPERATOR: &str = "Unknown operator";

const STATIONS_JSON: &str = include_str!("../../resources/stations.json");
const OPERATORS_JSON: &str = include_str!("../../resources/operators.json");

#[derive(Deserialize)]
struct StationEntry {
    crs: String,
    #[serde(rename = "Value")]
    name: String,
}

#[derive(Deserialize)]
struct StationFile {
    version: String,
    #[serde(rename = "StationList")]
    station_list: Vec<StationEntry>,
}

#[derive(Deserialize)]
struct OperatorEntry {
    code: String,
    name: String,
}

#[derive(Deserialize)]
struct OperatorFile {
    version: String,
    #[serde(rename = "TocList")]
    toc_list: Vec<OperatorEntry>,
}

/// Code to name table, kept sorted by code
#[derive(Debug, Clone)]
pub struct CodeTable {
    version: String,
    entries: Vec<(String, String)>,
}

impl CodeTable {
    pub fn new(version: impl Into<String>, mut entries: Vec<(String, String)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            version: version.into(),
            entries,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search on the code
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|(c, _)| c.as_str().cmp(code))
            .ok()
            .map(|idx| self.entries[idx].1.as_str())
    }
}

/// Both bundled tables
#[derive(Debug, Clone)]
pub struct Lookup {
    stations: CodeTable,
    operators: CodeTable,
}

impl Lookup {
    pub fn new(stations: CodeTable, operators: CodeTable) -> Self {
        Self {
            stations,
            operators,
        }
    }

    /// Load the tables compiled into the binary
    pub fn bundled() -> ApiResult<Self> {
        Self::from_json(STATIONS_JSON, OPERATORS_JSON)
    }

    /// Bundled operator table with the station list read from `path`
    pub async fn with_station_file(path: &Path) -> ApiResult<Self> {
        let stations = fs::read_to_string(path).await?;
        Self::from_json(&stations, OPERATORS_JSON)
    }

    pub fn from_json(stations_json: &str, operators_json: &str) -> ApiResult<Self> {
        let stations: StationFile = serde_json::from_str(stations_json)?;
        let operators: OperatorFile = serde_json::from_str(operators_json)?;

        let stations = CodeTable::new(
            stations.version,
            stations
                .station_list
                .into_iter()
                .map(|s| (s.crs, s.name))
                .collect(),
        );
        if stations.is_empty() {
            return Err(ApiError::Internal("station list is empty".to_string()));
        }

        Ok(Self::new(
            stations,
            CodeTable::new(
                operators.version,
                operators
                    .toc_list
                    .into_iter()
                    .map(|o| (o.code, o.name))
                    .collect(),
            ),
        ))
    }

    pub fn stations(&self) -> &CodeTable {
        &self.stations
    }

    pub fn station_name(&self, crs: &str) -> ApiResult<&str> {
        if crs == ANY_DESTINATION {
            return Ok(ANY_STATION);
        }
        self.stations.get(crs).ok_or_else(|| {
            ApiError::NotFound(format!(
                "station {} (station list {})",
                crs,
                self.stations.version()
            ))
        })
    }

    pub fn operator_name(&self, code: &str) -> ApiResult<&str> {
        self.operators.get(code).ok_or_else(|| {
            ApiError::NotFound(format!(
                "operator {} (operator list {})",
                code,
                self.operators.version()
            ))
        })
    }

    /// Station name, or the unknown placeholder
    pub fn station_label(&self, crs: &str) -> &str {
        self.station_name(crs).unwrap_or(UNKNOWN_STATION)
    }

    /// Operator name, or the unknown placeholder
    pub fn operator_label(&self, code: &str) -> &str {
        self.operator_name(code).unwrap_or(UNKNOWN_OPERATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CodeTable {
        CodeTable::new(
            "test",
            vec![
                ("RDG".to_string(), "Reading".to_string()),
                ("PAD".to_string(), "London Paddington".to_string()),
                ("ABD".to_string(), "Aberdeen".to_string()),
                ("YRK".to_string(), "York".to_string()),
                ("MAN".to_string(), "Manchester Piccadilly".to_string()),
                ("TWY".to_string(), "Twyford".to_string()),
                ("EDB".to_string(), "Edinburgh".to_string()),
            ],
        )
    }

    #[test]
    fn test_binary_search_matches_scan() {
        let table = sample();
        let codes = ["ABD", "EDB", "MAN", "PAD", "RDG", "TWY", "YRK", "AAA", "ZZZ", "NOP", "RD"];
        for code in codes {
            let scanned = table
                .entries
                .iter()
                .find(|(c, _)| c == code)
                .map(|(_, n)| n.as_str());
            assert_eq!(table.get(code), scanned, "code {}", code);
        }
    }

    #[test]
    fn test_bundled_tables_cover_scan() {
        let lookup = Lookup::bundled().unwrap();
        assert!(!lookup.stations().is_empty());
        for (code, name) in &lookup.stations.entries {
            assert_eq!(lookup.station_name(code).unwrap(), name);
        }
        for (code, name) in &lookup.operators.entries {
            assert_eq!(lookup.operator_name(code).unwrap(), name);
        }
    }

    #[test]
    fn test_station_name() {
        let lookup = Lookup::bundled().unwrap();
        assert_eq!(lookup.station_name("RDG").unwrap(), "Reading");
        assert_eq!(lookup.station_name("*").unwrap(), ANY_STATION);
        assert!(matches!(
            lookup.station_name("QQQ"),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(lookup.station_label("QQQ"), UNKNOWN_STATION);
    }

    #[test]
    fn test_bundled_covers_minor_stations() {
        let lookup = Lookup::bundled().unwrap();
        assert!(lookup.stations().len() > 400);
        assert_eq!(lookup.station_name("MAI").unwrap(), "Maidenhead");
        assert_eq!(lookup.station_name("BMH").unwrap(), "Bournemouth");
        assert_eq!(lookup.station_name("SSD").unwrap(), "Stansted Airport");
        assert_eq!(lookup.station_name("TLH").unwrap(), "Tilehurst");
    }

    #[tokio::test]
    async fn test_station_file_replaces_bundled_list() {
        let dir = crate::repo::scratch_dir("stations");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stations.json");
        std::fs::write(
            &path,
            r#"{"version":"full-1","StationList":[{"crs":"ZZB","Value":"Zed Bridge"},{"crs":"AAX","Value":"Ax Halt"}]}"#,
        )
        .unwrap();

        let lookup = Lookup::with_station_file(&path).await.unwrap();
        assert_eq!(lookup.stations().version(), "full-1");
        assert_eq!(lookup.station_name("AAX").unwrap(), "Ax Halt");
        assert!(lookup.station_name("RDG").is_err());
        assert_eq!(lookup.operator_name("GW").unwrap(), "Great Western Railway");

        assert!(Lookup::with_station_file(&dir.join("missing.json")).await.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_operator_name() {
        let lookup = Lookup::bundled().unwrap();
        assert_eq!(lookup.operator_name("GW").unwrap(), "Great Western Railway");
        assert!(lookup.operator_name("ZZ").is_err());
        assert_eq!(lookup.operator_label("ZZ"), UNKNOWN_OPERATOR);
    }
}
