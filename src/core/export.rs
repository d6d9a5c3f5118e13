// PharmaLens - core/export.rs
//
// CSV and JSON export of the current list view.
// Core layer: writes to any Write trait object.

use crate::core::views::ListRow;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Export list rows to CSV, one line per pharmacy.
///
/// Writes: id, name, address, city, average_rating, total_reviews, rank,
/// phone, filtered_reviews, filtered_mean
pub fn export_csv<W: Write>(
    rows: &[ListRow],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "id",
            "name",
            "address",
            "city",
            "average_rating",
            "total_reviews",
            "rank",
            "phone",
            "filtered_reviews",
            "filtered_mean",
        ])
        .map_err(csv_err)?;

    let mut count = 0;
    for row in rows {
        let mean = row
            .digest
            .mean_rating
            .map(|m| format!("{m:.2}"))
            .unwrap_or_default();
        csv_writer
            .write_record([
                row.pharmacy_id.as_str(),
                &row.name,
                &row.address,
                &row.city,
                &format!("{:.1}", row.average_rating),
                &row.total_reviews.to_string(),
                &row.rank.to_string(),
                row.phone_link.as_deref().unwrap_or(""),
                &row.digest.count.to_string(),
                &mean,
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export list rows, related reviews included, as a pretty JSON array.
pub fn export_json<W: Write>(
    rows: &[ListRow],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(writer, rows).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PharmacyId, ReviewBand};
    use crate::core::views::ReviewDigest;

    fn make_row(id: &str, name: &str) -> ListRow {
        ListRow {
            pharmacy_id: PharmacyId::from(id),
            name: name.to_string(),
            address: "Marktgasse 1, 3011 Bern, Switzerland".to_string(),
            city: "Bern".to_string(),
            average_rating: 4.25,
            stars: 4,
            total_reviews: 80,
            review_band: ReviewBand::From50To100,
            rank: 2,
            phone_link: Some("tel:41310000001".to_string()),
            digest: ReviewDigest {
                count: 0,
                mean_rating: None,
            },
            reviews: Vec::new(),
        }
    }

    #[test]
    fn test_csv_export() {
        let rows = vec![make_row("1", "Apotheke One"), make_row("2", "Apotheke Two")];
        let mut buf = Vec::new();
        let count = export_csv(&rows, &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("id,name,address"));
        assert!(output.contains("Apotheke One"));
        // Address contains commas and must be quoted.
        assert!(output.contains("\"Marktgasse 1, 3011 Bern, Switzerland\""));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_json_export() {
        let rows = vec![make_row("7", "Test Apotheke")];
        let mut buf = Vec::new();
        let count = export_json(&rows, &mut buf, Path::new("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["name"], "Test Apotheke");
        assert_eq!(value[0]["review_band"], "from50_to100");
    }
}
