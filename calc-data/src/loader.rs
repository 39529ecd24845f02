use std::collections::HashMap;
use std::io::Read;

use calc_core::{RateBand, RateTable, RateTableError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading rate tables.
#[derive(Debug, Error)]
pub enum RateTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid table '{table_id}': {source}")]
    InvalidTable {
        table_id: String,
        #[source]
        source: RateTableError,
    },
}

impl From<csv::Error> for RateTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RateTableLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a rate table CSV file.
///
/// - `table_id`: the table the band belongs to (e.g. `income-tax`)
/// - `upper_bound`: inclusive upper bound of the band (empty for unbounded)
/// - `rate`: marginal rate as a decimal fraction, or a fixed amount for
///   lookup tables
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateTableRecord {
    pub table_id: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for rate tables kept in CSV files, so brackets and bands can be
/// updated without recompiling.
pub struct RateTableLoader;

impl RateTableLoader {
    /// Parse rate table records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateTableRecord>, RateTableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RateTableRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records by `table_id` and validate each group.
    ///
    /// Tables are returned in order of first appearance; bands keep their
    /// file order within a table.
    pub fn build(
        records: &[RateTableRecord],
    ) -> Result<Vec<(String, RateTable)>, RateTableLoaderError> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<RateBand>> = HashMap::new();

        for record in records {
            let bands = groups.entry(record.table_id.as_str()).or_insert_with(|| {
                order.push(record.table_id.as_str());
                Vec::new()
            });
            bands.push(RateBand {
                upper_bound: record.upper_bound,
                rate: record.rate,
            });
        }

        order
            .into_iter()
            .map(|table_id| {
                let bands = groups.remove(table_id).unwrap_or_default();
                RateTable::new(bands)
                    .map(|table| (table_id.to_string(), table))
                    .map_err(|source| RateTableLoaderError::InvalidTable {
                        table_id: table_id.to_string(),
                        source,
                    })
            })
            .collect()
    }

    /// Parse and build in one step, keyed by table id.
    pub fn load<R: Read>(reader: R) -> Result<HashMap<String, RateTable>, RateTableLoaderError> {
        let records = Self::parse(reader)?;
        Ok(Self::build(&records)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"table_id,upper_bound,rate
income-tax,28000,0.23
income-tax,50000,0.35
income-tax,,0.43
vehicle-cost,8,20
vehicle-cost,11.99,59
vehicle-cost,,224
"#;

    #[test]
    fn test_parse_single_band() {
        let csv = "table_id,upper_bound,rate\nincome-tax,28000,0.23";

        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![RateTableRecord {
                table_id: "income-tax".to_string(),
                upper_bound: Some(dec!(28000)),
                rate: dec!(0.23),
            }]
        );
    }

    #[test]
    fn test_parse_unbounded_band() {
        let csv = "table_id,upper_bound,rate\nincome-tax,,0.43";

        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].upper_bound, None);
        assert_eq!(records[0].rate, dec!(0.43));
    }

    #[test]
    fn test_build_groups_in_file_order() {
        let records = RateTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
        let tables = RateTableLoader::build(&records).expect("Failed to build tables");

        let ids: Vec<_> = tables.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["income-tax", "vehicle-cost"]);
        assert_eq!(tables[0].1.len(), 3);
        assert_eq!(tables[1].1.bands()[1].rate, dec!(59));
    }

    #[test]
    fn test_load_keys_by_table_id() {
        let tables = RateTableLoader::load(TEST_CSV.as_bytes()).expect("Failed to load tables");

        assert_eq!(tables.len(), 2);
        assert_eq!(tables["income-tax"].last().rate, dec!(0.43));
    }

    #[test]
    fn test_build_rejects_decreasing_bounds() {
        let csv = "table_id,upper_bound,rate\nbad,100,0.1\nbad,50,0.2\n";
        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        let err = RateTableLoader::build(&records).expect_err("Should fail for decreasing bounds");

        match err {
            RateTableLoaderError::InvalidTable { table_id, source } => {
                assert_eq!(table_id, "bad");
                assert!(matches!(source, RateTableError::NotIncreasing { index: 1, .. }));
            }
            other => panic!("expected InvalidTable, got {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_unbounded_band_before_last() {
        let csv = "table_id,upper_bound,rate\nbad,,0.1\nbad,50,0.2\n";
        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(matches!(
            RateTableLoader::build(&records),
            Err(RateTableLoaderError::InvalidTable {
                source: RateTableError::UnboundedNotLast(0),
                ..
            })
        ));
    }

    #[test]
    fn test_build_rejects_non_positive_bound() {
        let csv = "table_id,upper_bound,rate\nincome-tax,-100,0.10\nincome-tax,100,0.20\nincome-tax,,0.50\n";
        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        let err = RateTableLoader::build(&records).expect_err("Should fail for a negative bound");

        match err {
            RateTableLoaderError::InvalidTable { table_id, source } => {
                assert_eq!(table_id, "income-tax");
                assert_eq!(
                    source,
                    RateTableError::NonPositiveBound {
                        index: 0,
                        bound: dec!(-100),
                    }
                );
            }
            other => panic!("expected InvalidTable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "table_id,upper_bound\nincome-tax,100";

        let err = RateTableLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");
        let RateTableLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_invalid_csv_bad_decimal() {
        let csv = "table_id,upper_bound,rate\nincome-tax,abc,0.10";

        let err = RateTableLoader::parse(csv.as_bytes()).expect_err("Should fail for invalid decimal");

        assert!(matches!(err, RateTableLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv = "table_id,upper_bound,rate\n";

        let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
        assert!(RateTableLoader::build(&records).unwrap().is_empty());
    }
}
