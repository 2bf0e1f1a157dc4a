//! CSV decoding shared by the client and feature tables.

use crate::error::Result;
use polars::prelude::*;
use std::io::Cursor;

/// Rows scanned to infer column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Decode a CSV document with a header row into a frame.
pub(crate) fn read_csv(bytes: &[u8]) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let csv = b"SK_ID_CURR,CODE_GENDER,AMT_CREDIT\n101,F,1000.5\n102,M,\n";
        let frame = read_csv(csv).unwrap();
        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(frame.column("AMT_CREDIT").unwrap().null_count(), 1);
    }
}
