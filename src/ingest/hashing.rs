use md5::{Digest, Md5};
use std::io::Read;

/// Digest a byte source in fixed-size chunks into a lowercase hex string.
///
/// The digest identifies content for deduplication; it is not used for
/// anything security-sensitive. Output is independent of how the reader
/// chunks its bytes.
pub fn content_hash<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Md5::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
