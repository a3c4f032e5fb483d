//! CSV loading

use crate::data::{DataError, Frame};
use polars::prelude::*;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

fn read_options() -> CsvReadOptions {
    // scan every row so a late non-numeric cell makes the column categorical
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
}

impl Frame {
    /// Load a frame from a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Frame, DataError> {
        debug!("Reading CSV from {}", path.as_ref().display());
        let file = File::open(path.as_ref())?;
        let df = read_options().into_reader_with_file_handle(file).finish()?;
        loaded(df)
    }

    /// Load a frame from any CSV source with a header row
    ///
    /// Empty cells are missing values. A column is numeric when every
    /// non-empty cell parses as a number, categorical otherwise.
    pub fn from_csv_reader<R: Read>(mut source: R) -> Result<Frame, DataError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let df = read_options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        loaded(df)
    }
}

fn loaded(df: DataFrame) -> Result<Frame, DataError> {
    let frame = Frame::try_from(df)?;
    debug!("Loaded frame with {} rows and {} columns", frame.n_rows(), frame.n_cols());
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{label_at, ColumnKind};

    #[test]
    fn test_csv_type_inference_and_missing_cells() {
        let csv = "age,city,bought\n30,paris,1\n,rome,0\n45,,1\n";
        let frame = Frame::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(frame.n_rows(), 3);
        let age = frame.column("age").unwrap();
        assert_eq!(ColumnKind::of(age), Some(ColumnKind::Numeric));
        assert_eq!(
            age.f64().unwrap().iter().collect::<Vec<_>>(),
            vec![Some(30.0), None, Some(45.0)]
        );

        let city = frame.column("city").unwrap();
        assert_eq!(ColumnKind::of(city), Some(ColumnKind::Categorical));
        assert_eq!(city.null_count(), 1);
        assert_eq!(label_at(city, 1).as_deref(), Some("rome"));
        assert_eq!(frame.column("bought").map(|c| c.null_count()), Some(0));
    }

    #[test]
    fn test_mixed_column_is_categorical() {
        let csv = "code\n1\n2\nx7\n";
        let frame = Frame::from_csv_reader(csv.as_bytes()).unwrap();
        let code = frame.column("code").unwrap();
        assert_eq!(ColumnKind::of(code), Some(ColumnKind::Categorical));
        assert_eq!(label_at(code, 2).as_deref(), Some("x7"));
    }

    #[test]
    fn test_csv_file_feeds_design_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2.5\n3,4\n").unwrap();

        let frame = Frame::from_csv_path(&path).unwrap();
        let array = frame.to_array().unwrap();
        assert_eq!(array.shape(), &[2, 2]);
        assert_eq!(array[[1, 0]], 3.0);
        assert_eq!(array[[0, 1]], 2.5);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        assert!(matches!(
            Frame::from_csv_path("/nonexistent/data.csv"),
            Err(DataError::Io(_))
        ));
    }
}
