use std::io::Read;

use tracing::debug;

use crate::error::AppError;
use crate::model::LogoAttachment;

/// Logos must be strictly smaller than 2 MiB.
pub const MAX_LOGO_BYTES: u64 = 2 * 1024 * 1024;

/// Reject attachments at or above the size limit.
pub fn check_logo_size(size: u64) -> Result<(), AppError> {
    if size < MAX_LOGO_BYTES {
        Ok(())
    } else {
        Err(AppError::AttachmentTooLarge { size, limit: MAX_LOGO_BYTES })
    }
}

/// Read a logo from a file path or an http(s) URL. The bytes are kept
/// encoded; nothing here checks that they are a decodable image.
pub fn load_logo(source: &str) -> Result<LogoAttachment, AppError> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_url(source)?
    } else {
        read_file(source)?
    };

    debug!(source, size = bytes.len(), "loaded logo");
    Ok(LogoAttachment { source: source.to_string(), bytes })
}

fn read_file(path: &str) -> Result<Vec<u8>, AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::LogoError(format!("{}: {}", path, e)))?;
    check_logo_size(metadata.len())?;

    std::fs::read(path).map_err(|e| AppError::LogoError(format!("{}: {}", path, e)))
}

fn fetch_url(url: &str) -> Result<Vec<u8>, AppError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| AppError::LogoError(format!("Failed to fetch URL: {}", e)))?;

    if let Some(len) = response.header("Content-Length").and_then(|v| v.parse::<u64>().ok()) {
        check_logo_size(len)?;
    }

    // Read one byte past the limit so an oversize body is detected without buffering all of it
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_LOGO_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| AppError::LogoError(format!("Failed to read response: {}", e)))?;
    check_logo_size(bytes.len() as u64)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_is_strict() {
        assert!(check_logo_size(2_097_151).is_ok());
        assert!(matches!(
            check_logo_size(2_097_152),
            Err(AppError::AttachmentTooLarge { size: 2_097_152, limit: 2_097_152 })
        ));
        assert!(check_logo_size(0).is_ok());
    }

    #[test]
    fn test_missing_file_is_a_logo_error() {
        let result = load_logo("definitely/not/here.png");
        assert!(matches!(result, Err(AppError::LogoError(_))));
    }

    #[test]
    fn test_reads_file_bytes_without_decoding() {
        let dir = std::env::temp_dir().join("papertrail-logo-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-an-image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let logo = load_logo(path.to_str().unwrap()).unwrap();
        assert_eq!(logo.bytes, b"plain text");
        assert!(logo.source.ends_with("not-an-image.png"));
    }
}
