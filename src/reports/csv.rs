use crate::Result;
use crate::records::Record;
use std::io::Write;

/// Write `records` as CSV with a header row taken from the record's field names.
///
/// Nothing, not even a header, is written when `records` is empty.
pub fn generate<R: Record, W: Write>(records: &[R], writer: W) -> Result<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
