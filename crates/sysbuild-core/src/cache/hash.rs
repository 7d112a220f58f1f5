use std::path::Path;

/// Compute the Blake3 digest of a file's full content, hex encoded
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(hash_bytes(&content))
}

/// Compute the Blake3 digest of in-memory content, hex encoded
pub fn hash_bytes(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
