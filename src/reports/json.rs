use crate::Result;
use crate::model::FetchBatch;
use core::fmt::Write;

pub fn generate<W: Write>(batch: &FetchBatch, writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(batch)?)?;
    Ok(())
}
