//! Archive unpacking and executable lookup. All functions block; call them
//! from `spawn_blocking`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::read::GzDecoder;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::Result;

/// Unpack a gzip-compressed tarball into `dest`.
pub fn unpack_tarball(archive_path: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .with_context(|| format!("failed to unpack tarball {}", archive_path.display()))?;
    Ok(())
}

/// Unpack a zip archive into `dest`. Entries escaping `dest` are rejected.
pub fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to open zip {}", archive_path.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read zip entry")?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(anyhow::anyhow!(
                "zip entry '{}' escapes the extraction directory",
                entry.name()
            )
            .into());
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Find a regular file called `name` under `root`, preferring the shallowest match.
pub fn find_executable(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == name)
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Build an in-memory `.tar.gz` containing the given files.
    pub fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, path, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Build an in-memory `.zip` containing the given files.
    pub fn zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (path, data) in files {
            writer
                .start_file(*path, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_tarball_and_find_nested_binary() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        std::fs::write(
            &archive,
            fixtures::tarball(&[
                ("delta-0.18.2/README.md", "docs"),
                ("delta-0.18.2/delta", "#!/bin/sh\necho delta\n"),
            ]),
        )
        .unwrap();

        let out = dir.path().join("out");
        unpack_tarball(&archive, &out).unwrap();

        let found = find_executable(&out, "delta").unwrap();
        assert!(found.ends_with("delta-0.18.2/delta"));
    }

    #[test]
    fn test_unpack_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        std::fs::write(&archive, fixtures::zip(&[("bin/eza", "binary")])).unwrap();

        let out = dir.path().join("out");
        unpack_zip(&archive, &out).unwrap();

        let found = find_executable(&out, "eza").unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"binary");
    }

    #[test]
    fn test_find_executable_prefers_shallowest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/tool"), b"deep").unwrap();
        std::fs::write(dir.path().join("tool"), b"top").unwrap();

        let found = find_executable(dir.path(), "tool").unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"top");
    }

    #[test]
    fn test_find_executable_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_executable(dir.path(), "nothing").is_none());
    }

    #[test]
    fn test_unpack_tarball_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        std::fs::write(&archive, b"not a tarball").unwrap();
        assert!(unpack_tarball(&archive, &dir.path().join("out")).is_err());
    }
}
