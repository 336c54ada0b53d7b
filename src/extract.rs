//! Archive extraction.
//!
//! [`TarGzExtractor`] unpacks into `<dest>.partial` and renames the staging
//! directory onto `dest` once every entry has been written. Entries that would
//! land outside the destination (absolute paths, `..` components, links
//! pointing upward) are rejected before anything is written for them.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use tar::{Archive, EntryType};

use crate::error::{Error, Result};

/// Trait for archive extraction - allows mocking in tests
pub trait Extractor: Send + Sync {
    /// Unpacks `archive` so that its entries end up under `dest`.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Extractor for gzip-compressed tarballs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzExtractor;

/// Path of the staging directory an archive is unpacked into.
pub fn staging_dir(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn extraction_error(archive: &Path, message: impl ToString) -> Error {
    Error::Extraction {
        archive: archive.to_path_buf(),
        message: message.to_string(),
    }
}

/// Whether `path` stays inside the directory it is joined to.
fn is_contained(path: &Path) -> bool {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

impl TarGzExtractor {
    fn unpack_into(&self, archive_path: &Path, staging: &Path) -> Result<usize> {
        let file = File::open(archive_path).map_err(|e| Error::filesystem(archive_path, e))?;
        let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
        let entries = archive
            .entries()
            .map_err(|e| extraction_error(archive_path, e))?;

        let mut count = 0;
        for entry in entries {
            let mut entry = entry.map_err(|e| extraction_error(archive_path, e))?;
            let path = entry
                .path()
                .map_err(|e| extraction_error(archive_path, e))?
                .into_owned();

            if !is_contained(&path) {
                return Err(extraction_error(
                    archive_path,
                    format!("entry '{}' escapes the destination", path.display()),
                ));
            }

            let kind = entry.header().entry_type();
            if matches!(kind, EntryType::Symlink | EntryType::Link) {
                let target = entry
                    .link_name()
                    .map_err(|e| extraction_error(archive_path, e))?
                    .map(|target| target.into_owned());
                if let Some(target) = target {
                    // Symlink targets resolve from the entry's directory,
                    // hard links from the archive root.
                    let resolved = match (kind, path.parent()) {
                        (EntryType::Symlink, Some(parent)) => parent.join(&target),
                        _ => target.clone(),
                    };
                    if !is_contained(&resolved) {
                        return Err(extraction_error(
                            archive_path,
                            format!(
                                "link '{}' points outside the destination ('{}')",
                                path.display(),
                                target.display()
                            ),
                        ));
                    }
                }
            }

            let unpacked = entry
                .unpack_in(staging)
                .map_err(|e| extraction_error(archive_path, e))?;
            if !unpacked {
                return Err(extraction_error(
                    archive_path,
                    format!("entry '{}' escapes the destination", path.display()),
                ));
            }
            count += 1;
        }
        Ok(count)
    }
}

impl Extractor for TarGzExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        info!("Decompressing {} to {}", archive.display(), dest.display());

        let staging = staging_dir(dest);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| Error::filesystem(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| Error::filesystem(&staging, e))?;

        let count = self.unpack_into(archive, &staging)?;

        if dest.exists() {
            fs::remove_dir_all(dest).map_err(|e| Error::filesystem(dest, e))?;
        }
        fs::rename(&staging, dest).map_err(|e| Error::filesystem(dest, e))?;
        debug!("Unpacked {} entries into {}", count, dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    /// Writes an entry whose raw name bypasses the builder's path checks.
    fn write_raw_archive(path: &Path, name: &str, link: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let mut header = tar::Header::new_gnu();
        {
            let gnu = header.as_gnu_mut().unwrap();
            gnu.name[..name.len()].copy_from_slice(name.as_bytes());
        }
        match link {
            Some(target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_link_name(target).unwrap();
                header.set_size(0);
            }
            None => header.set_size(4),
        }
        header.set_mode(0o644);
        header.set_cksum();
        let data: &[u8] = if link.is_some() { b"" } else { b"evil" };
        builder.append(&header, data).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extracts_into_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("hadoop.tar.gz");
        write_archive(
            &archive,
            &[
                ("bin/hdfs", &b"#!/bin/sh\n"[..]),
                ("etc/hadoop/core-site.xml", &b"<x/>"[..]),
            ],
        );
        let dest = temp.path().join("hadoop-bin");

        TarGzExtractor.extract(&archive, &dest).unwrap();

        assert_eq!(fs::read(dest.join("bin/hdfs")).unwrap(), b"#!/bin/sh\n");
        assert!(dest.join("etc/hadoop/core-site.xml").is_file());
        assert!(!staging_dir(&dest).exists());
    }

    #[test]
    fn test_rejects_parent_dir_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar.gz");
        write_raw_archive(&archive, "../escape.txt", None);
        let dest = temp.path().join("out").join("evil-bin");

        let err = TarGzExtractor.extract(&archive, &dest).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(err.to_string().contains("escapes the destination"));
        assert!(!temp.path().join("out").join("escape.txt").exists());
        assert!(!dest.exists());
    }

    #[test]
    fn test_rejects_escaping_symlink() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("link.tar.gz");
        write_raw_archive(&archive, "lib/link", Some("../../../etc/passwd"));
        let dest = temp.path().join("link-bin");

        let err = TarGzExtractor.extract(&archive, &dest).unwrap_err();
        assert!(err.to_string().contains("points outside"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("corrupt.tar.gz");
        fs::write(&archive, b"not a gzip stream").unwrap();

        let err = TarGzExtractor
            .extract(&archive, &temp.path().join("corrupt-bin"))
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_missing_archive_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let err = TarGzExtractor
            .extract(&temp.path().join("missing.tar.gz"), &temp.path().join("x"))
            .unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained(Path::new("a/b/../c")));
        assert!(is_contained(Path::new("./a")));
        assert!(!is_contained(Path::new("../a")));
        assert!(!is_contained(Path::new("a/../../b")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }
}
