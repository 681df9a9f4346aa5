//! Result persistence.
//!
//! One pretty-printed JSON file per run, named after the input image stem.
//! serde_json writes non-ASCII text literally, so Korean store and menu
//! names land in the file unescaped.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::models::ReceiptRecord;

/// Write the record under `output_dir` as `<input-stem>_result.json`.
///
/// Creates the directory when absent. Returns the path of the written file.
pub fn write_result(
    output_dir: &Path,
    input_path: &Path,
    record: &ReceiptRecord,
) -> io::Result<PathBuf> {
    if !output_dir.exists() {
        info!("creating missing output directory {}", output_dir.display());
        fs::create_dir_all(output_dir)?;
    }

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("receipt");
    let path = output_dir.join(format!("{stem}_result.json"));

    fs::write(&path, render_pretty(record))?;
    info!("wrote result to {}", path.display());
    Ok(path)
}

/// Pretty-print a record with a trailing newline.
pub fn render_pretty(record: &ReceiptRecord) -> String {
    let mut json =
        serde_json::to_string_pretty(record).expect("Failed to serialize receipt record");
    json.push('\n');
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;

    fn sample_record() -> ReceiptRecord {
        ReceiptRecord {
            store_name: Some("탕화쿵푸마라탕(호계)".to_string()),
            address: None,
            menu_items: vec![MenuItem {
                name: "마라탕보통맛".to_string(),
                price: 9600,
            }],
            total_price: Some(9600),
        }
    }

    #[test]
    fn test_output_named_after_input_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_result(
            dir.path(),
            Path::new("input/receipt.jpg"),
            &sample_record(),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("receipt_result.json"));
        assert!(path.is_file());
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("output");

        write_result(&output_dir, Path::new("receipt.png"), &sample_record()).unwrap();
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_round_trip_preserves_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record();
        let path = write_result(dir.path(), Path::new("receipt.jpg"), &record).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let reparsed: ReceiptRecord = serde_json::from_str(&written).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_korean_text_written_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_result(dir.path(), Path::new("receipt.jpg"), &sample_record()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("탕화쿵푸마라탕(호계)"));
        assert!(!written.contains("\\u"));
    }

    #[test]
    fn test_prices_serialized_as_integers() {
        let written = render_pretty(&sample_record());
        assert!(written.contains("\"price\": 9600"));
        assert!(written.contains("\"totalPrice\": 9600"));
        assert!(!written.contains("\"9600\""));
    }
}
