//! CSV readers for the hypotheses, orders and visits tables.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::models::{Hypothesis, Order, Visit};
use crate::error::{Error, Result};

/// Deserialize every row of a delimited table.
pub fn read_records<T, R>(reader: R, delimiter: u8) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn read_file<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>> {
    let wrap = |reason: String| Error::DatasetError {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| wrap(e.to_string()))?;
    let rows = read_records(file, delimiter).map_err(|e| wrap(e.to_string()))?;
    debug!(path = %path.display(), rows = rows.len(), "Loaded table");
    Ok(rows)
}

/// Hypotheses table (upstream file is `;`-delimited).
pub fn load_hypotheses<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<Hypothesis>> {
    read_file(path.as_ref(), delimiter)
}

pub fn load_orders<P: AsRef<Path>>(path: P) -> Result<Vec<Order>> {
    read_file(path.as_ref(), b',')
}

pub fn load_visits<P: AsRef<Path>>(path: P) -> Result<Vec<Visit>> {
    read_file(path.as_ref(), b',')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Group;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_capitalized_semicolon_hypotheses() {
        let data = "Hypothesis;Reach;Impact;Confidence;Effort\n\
                    Add two new channels for attracting traffic;3;10;8;6\n\
                    Launch your own delivery service;2;5;4;10\n";
        let rows: Vec<Hypothesis> = read_records(data.as_bytes(), b';').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Add two new channels for attracting traffic");
        assert_eq!(rows[0].reach, 3);
        assert_eq!(rows[1].effort, 10);
    }

    #[test]
    fn reads_lowercase_hypothesis_headers() {
        let data = "hypothesis,reach,impact,confidence,effort\nX,1,2,3,4\n";
        let rows: Vec<Hypothesis> = read_records(data.as_bytes(), b',').unwrap();
        assert_eq!(rows[0], Hypothesis::new("X", 1, 2, 3, 4));
    }

    #[test]
    fn reads_orders_with_camel_case_headers() {
        let data = "transactionId,visitorId,date,revenue,group\n\
                    3667963787,3312258926,2019-08-15,30.4,B\n\
                    2804400009,3642806036,2019-08-15,15.2, A\n";
        let rows: Vec<Order> = read_records(data.as_bytes(), b',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, Group::B);
        assert_eq!(rows[1].group, Group::A);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2019, 8, 15).unwrap());
        assert!((rows[1].revenue - 15.2).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_date() {
        let data = "date,group,visits\n15/08/2019,A,719\n";
        let result: Result<Vec<Visit>> = read_records(data.as_bytes(), b',');
        assert!(matches!(result, Err(Error::CsvError(_))));
    }

    #[test]
    fn load_visits_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "date,group,visits").unwrap();
        writeln!(file, "2019-08-01,A,719").unwrap();
        writeln!(file, "2019-08-01,B,713").unwrap();

        let visits = load_visits(file.path()).unwrap();
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].visits, 719);
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = load_orders("/nonexistent/orders_us.csv").unwrap_err();
        match err {
            Error::DatasetError { path, .. } => assert!(path.ends_with("orders_us.csv")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
