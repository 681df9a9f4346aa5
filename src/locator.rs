//! Input image discovery.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::info;

/// A located receipt image ready for OCR submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    /// Full path to the image file.
    pub path: PathBuf,
    /// Image format declared to the OCR provider (lowercase).
    pub format: String,
}

/// Scan `input_dir` for a file whose stem is `receipt`, any extension.
///
/// Creates the directory when absent so the user has somewhere to drop the
/// image on first run. Returns `Ok(None)` when no match exists; the caller
/// decides whether that aborts the run.
pub fn find_receipt_image(input_dir: &Path) -> io::Result<Option<ReceiptImage>> {
    if !input_dir.exists() {
        info!("creating missing input directory {}", input_dir.display());
        fs::create_dir_all(input_dir)?;
        return Ok(None);
    }

    scan_dir(input_dir)
}

/// Scan an existing directory for a receipt image without creating anything.
///
/// When several `receipt.*` files exist the first entry in directory-listing
/// order wins; that order is filesystem-dependent.
pub fn scan_dir(input_dir: &Path) -> io::Result<Option<ReceiptImage>> {
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.file_stem().and_then(|s| s.to_str()) != Some("receipt") {
            continue;
        }
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let format = normalize_format(extension);

        info!("found receipt image {} (format: {})", path.display(), format);
        return Ok(Some(ReceiptImage { path, format }));
    }

    Ok(None)
}

/// Map a file extension to the format name declared to the OCR provider.
/// JFIF files are JPEG on the wire.
fn normalize_format(extension: &str) -> String {
    let extension = extension.to_ascii_lowercase();
    if extension == "jfif" {
        "jpeg".to_string()
    } else {
        extension
    }
}
