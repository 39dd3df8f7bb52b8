//! Upload input and shape checks

use std::io::Cursor;

use super::error::FileRejection;

/// Longest accepted file name, in characters
pub const MAX_FILE_NAME_LEN: usize = 255;

/// A named byte stream submitted for ingestion
#[derive(Debug)]
pub struct Upload<R> {
    pub file_name: String,
    /// Content length in bytes
    pub size: u64,
    pub body: R,
}

impl<B> Upload<Cursor<B>>
where
    B: AsRef<[u8]> + Unpin,
{
    /// Upload backed by an in-memory buffer
    pub fn from_bytes(file_name: impl Into<String>, bytes: B) -> Self {
        let size = bytes.as_ref().len() as u64;
        Self {
            file_name: file_name.into(),
            size,
            body: Cursor::new(bytes),
        }
    }
}

/// Check everything about an upload that can be known without reading it
pub fn validate_upload(file_name: &str, size: u64) -> Result<(), FileRejection> {
    if size == 0 {
        return Err(FileRejection::EmptyContent);
    }

    if file_name.trim().is_empty() {
        return Err(FileRejection::EmptyName);
    }

    let is_csv = file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(FileRejection::NotCsv);
    }

    if file_name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(FileRejection::NameTooLong {
            max: MAX_FILE_NAME_LEN,
        });
    }

    if file_name.contains("..") || file_name.contains(['/', '\\']) {
        return Err(FileRejection::PathTraversal);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_csv_names() {
        assert!(validate_upload("data.csv", 10).is_ok());
        assert!(validate_upload("DATA.CSV", 10).is_ok());
        assert!(validate_upload("run 2024-01-01.Csv", 10).is_ok());
    }

    #[test]
    fn test_rejections() {
        assert_eq!(validate_upload("data.csv", 0), Err(FileRejection::EmptyContent));
        assert_eq!(validate_upload("  ", 10), Err(FileRejection::EmptyName));
        assert_eq!(validate_upload("data.txt", 10), Err(FileRejection::NotCsv));
        assert_eq!(validate_upload("csv", 10), Err(FileRejection::NotCsv));
        assert_eq!(validate_upload(".csv", 10), Err(FileRejection::NotCsv));
        assert_eq!(
            validate_upload("../etc/data.csv", 10),
            Err(FileRejection::PathTraversal)
        );
        assert_eq!(
            validate_upload("dir\\data.csv", 10),
            Err(FileRejection::PathTraversal)
        );
    }

    #[test]
    fn test_extension_is_checked_before_name_shape() {
        assert_eq!(validate_upload("../x.txt", 10), Err(FileRejection::NotCsv));

        let long = format!("{}.txt", "a".repeat(300));
        assert_eq!(validate_upload(&long, 10), Err(FileRejection::NotCsv));
    }

    #[test]
    fn test_name_length_counts_characters() {
        let name = format!("{}.csv", "é".repeat(MAX_FILE_NAME_LEN - 4));
        assert!(validate_upload(&name, 1).is_ok());

        let name = format!("{}.csv", "a".repeat(MAX_FILE_NAME_LEN - 3));
        assert_eq!(
            validate_upload(&name, 1),
            Err(FileRejection::NameTooLong { max: 255 })
        );
    }

    #[test]
    fn test_from_bytes_records_size() {
        let upload = Upload::from_bytes("a.csv", b"abc".to_vec());
        assert_eq!(upload.size, 3);
        assert_eq!(upload.file_name, "a.csv");
    }
}
