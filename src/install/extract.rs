//! Archive handling for downloaded launchers
//!
//! Coursier ships a single native executable per platform, gzip-compressed
//! on Linux and macOS and zipped on Windows.

use crate::error::{SetupError, SetupResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decompress `name.gz` to `name` and remove the archive, like `gzip -d`
pub fn gunzip_in_place(archive: &Path) -> SetupResult<PathBuf> {
    let output = archive
        .to_str()
        .and_then(|s| s.strip_suffix(".gz"))
        .map(PathBuf::from)
        .ok_or_else(|| SetupError::extract(archive, "expected a .gz file"))?;

    debug!("Decompressing {}", archive.display());

    let input = File::open(archive).map_err(|e| SetupError::extract(archive, e))?;
    let mut decoder = GzDecoder::new(input);
    let mut out = File::create(&output).map_err(|e| SetupError::extract(&output, e))?;
    io::copy(&mut decoder, &mut out).map_err(|e| SetupError::extract(archive, e))?;
    drop(out);

    std::fs::remove_file(archive)
        .map_err(|e| SetupError::io(format!("removing {}", archive.display()), e))?;

    Ok(output)
}

/// Extract a single member from a zip archive into `dest_dir`.
///
/// Directory components inside the archive are dropped, like `unzip -j`.
pub fn unzip_member(archive: &Path, member: &str, dest_dir: &Path) -> SetupResult<PathBuf> {
    debug!("Extracting {} from {}", member, archive.display());

    let file = File::open(archive).map_err(|e| SetupError::extract(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| SetupError::extract(archive, e))?;

    let mut index = None;
    for i in 0..zip.len() {
        let entry = zip
            .by_index(i)
            .map_err(|e| SetupError::extract(archive, e))?;
        if entry.name().rsplit(['/', '\\']).next() == Some(member) {
            index = Some(i);
            break;
        }
    }
    let index = index.ok_or_else(|| SetupError::ArchiveMemberNotFound {
        archive: archive.to_path_buf(),
        member: member.to_string(),
    })?;

    std::fs::create_dir_all(dest_dir)
        .map_err(|e| SetupError::io(format!("creating {}", dest_dir.display()), e))?;

    let mut entry = zip
        .by_index(index)
        .map_err(|e| SetupError::extract(archive, e))?;
    let dest = dest_dir.join(member);
    let mut out = File::create(&dest).map_err(|e| SetupError::extract(&dest, e))?;
    io::copy(&mut entry, &mut out).map_err(|e| SetupError::extract(archive, e))?;

    Ok(dest)
}

/// Add the executable bits, a no-op where permissions have no such bit
pub fn make_executable(path: &Path) -> SetupResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)
            .map_err(|e| SetupError::io(format!("reading {}", path.display()), e))?
            .permissions();
        perms.set_mode(perms.mode() | 0o111);
        std::fs::set_permissions(path, perms)
            .map_err(|e| SetupError::io(format!("chmod +x {}", path.display()), e))?;
    }

    #[cfg(not(unix))]
    {
        if !path.exists() {
            return Err(SetupError::io(
                format!("chmod +x {}", path.display()),
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    pub(crate) fn gzip_bytes(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn gunzip_strips_extension_and_removes_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("3f2a.gz");
        std::fs::write(&archive, gzip_bytes(b"#!/bin/sh\necho cs\n")).unwrap();

        let out = gunzip_in_place(&archive).unwrap();

        assert_eq!(out, temp.path().join("3f2a"));
        assert!(!archive.exists());
        assert_eq!(std::fs::read(&out).unwrap(), b"#!/bin/sh\necho cs\n");
    }

    #[test]
    fn gunzip_rejects_wrong_extension() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("cs.zip");
        std::fs::write(&archive, b"x").unwrap();

        assert!(matches!(
            gunzip_in_place(&archive),
            Err(SetupError::Extract { .. })
        ));
    }

    #[test]
    fn gunzip_rejects_corrupt_data() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("cs.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        assert!(gunzip_in_place(&archive).is_err());
    }

    #[test]
    fn unzip_extracts_only_named_member() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("3f2a.zip");
        std::fs::write(
            &archive,
            zip_bytes(&[
                ("README.txt", b"readme"),
                ("cs-x86_64-pc-win32.exe", b"MZ-binary"),
            ]),
        )
        .unwrap();

        let dest_dir = temp.path().join("3f2a");
        let out = unzip_member(&archive, "cs-x86_64-pc-win32.exe", &dest_dir).unwrap();

        assert_eq!(out, dest_dir.join("cs-x86_64-pc-win32.exe"));
        assert_eq!(std::fs::read(&out).unwrap(), b"MZ-binary");
        let extracted: Vec<_> = std::fs::read_dir(&dest_dir).unwrap().collect();
        assert_eq!(extracted.len(), 1);
    }

    #[test]
    fn unzip_junks_directories() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        std::fs::write(
            &archive,
            zip_bytes(&[("dist/bin/cs-aarch64-pc-win32.exe", b"MZ")]),
        )
        .unwrap();

        let out =
            unzip_member(&archive, "cs-aarch64-pc-win32.exe", &temp.path().join("a")).unwrap();
        assert_eq!(out, temp.path().join("a").join("cs-aarch64-pc-win32.exe"));
    }

    #[test]
    fn unzip_missing_member() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        std::fs::write(&archive, zip_bytes(&[("other.exe", b"MZ")])).unwrap();

        let err = unzip_member(&archive, "cs-x86_64-pc-win32.exe", temp.path()).unwrap_err();
        assert!(matches!(err, SetupError::ArchiveMemberNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn make_executable_sets_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cs");
        std::fs::write(&path, b"bin").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        make_executable(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn make_executable_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(make_executable(&temp.path().join("nope")).is_err());
    }
}
