//! CSV export of measurement history.

use std::io::Write;

use crate::data::MeasurementRecord;
use crate::error::Result;
use crate::metrics::BmiCategory;

/// UTF-8 byte-order mark, expected by spreadsheet imports.
const BOM: &[u8] = b"\xef\xbb\xbf";

/// Write measurement history as CSV.
///
/// Output is UTF-8 with a byte-order mark, header
/// `Date,Weight (kg),BMI,Category`, one row per record with weight and
/// BMI formatted to one decimal place. The category is derived from the
/// stored BMI.
pub fn export_csv<W: Write>(writer: &mut W, records: &[MeasurementRecord]) -> Result<()> {
    writer.write_all(BOM)?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Date", "Weight (kg)", "BMI", "Category"])?;

    for record in records {
        csv.write_record([
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            format!("{:.1}", record.weight_kg),
            format!("{:.1}", record.bmi),
            BmiCategory::from_bmi(record.bmi).label().to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}
