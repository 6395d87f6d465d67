//! Streaming CRC32 computation for regular ROM files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Compute the CRC32 of a file, returned as lowercase hex.
///
/// Reads in fixed chunks so large disc images never load fully into
/// memory.
pub fn compute_crc32(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:08x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn crc32_of_check_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.bin");
        let mut f = File::create(&path).unwrap();
        // Standard CRC32 check input
        f.write_all(b"123456789").unwrap();
        drop(f);

        assert_eq!(compute_crc32(&path).unwrap(), "cbf43926");
    }

    #[test]
    fn crc32_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        File::create(&path).unwrap();
        assert_eq!(compute_crc32(&path).unwrap(), "00000000");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(compute_crc32(Path::new("/no/such/file")).is_err());
    }
}
