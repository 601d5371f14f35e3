//! Transport archive codec.
//!
//! An archive is a zstd-compressed tar of named files. Packing writes to a
//! temp sibling and renames on success, so a failed pack leaves nothing
//! behind. Unpacking refuses entries that would land outside the target
//! directory.

use crate::error::{StoreError, StoreResult};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path};
use tar::{Archive, Builder, Header};
use tracing::debug;

/// zstd level used for new archives.
pub const COMPRESSION_LEVEL: i32 = 19;

/// Local file header signature that opens every zip container.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Pack `entries` (`(archive name, source file)`) into `output`.
///
/// Returns the size of the written archive in bytes.
pub fn pack(entries: &[(&str, &Path)], output: &Path) -> StoreResult<u64> {
    let temp_path = output.with_extension("tmp");

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    match pack_inner(entries, &temp_path) {
        Ok(()) => {
            fs::rename(&temp_path, output)?;
            let size = fs::metadata(output)?.len();
            debug!(path = %output.display(), size, "archive written");
            Ok(size)
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn pack_inner(entries: &[(&str, &Path)], path: &Path) -> StoreResult<()> {
    let file = File::create(path)?;
    let zstd_writer = zstd::Encoder::new(BufWriter::new(file), COMPRESSION_LEVEL)
        .map_err(|e| StoreError::compression(format!("zstd encoder: {e}")))?;
    let mut tar_builder = Builder::new(zstd_writer);

    for (name, source) in entries {
        append_file(&mut tar_builder, name, source)?;
    }

    let zstd_writer = tar_builder
        .into_inner()
        .map_err(|e| StoreError::archive(format!("tar finish: {e}")))?;
    let mut buf_writer = zstd_writer
        .finish()
        .map_err(|e| StoreError::compression(format!("zstd finish: {e}")))?;
    buf_writer.flush()?;
    Ok(())
}

fn append_file<W: Write>(builder: &mut Builder<W>, name: &str, source: &Path) -> StoreResult<()> {
    let file = File::open(source)?;
    let size = file.metadata()?.len();

    let mut header = Header::new_gnu();
    header
        .set_path(name)
        .map_err(|e| StoreError::archive(format!("set path '{name}': {e}")))?;
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder
        .append(&header, BufReader::new(file))
        .map_err(|e| StoreError::archive(format!("append '{name}': {e}")))?;
    Ok(())
}

/// Extract the regular files named in `wanted` from `archive` into `dir`.
/// Other entries are skipped.
///
/// Returns the entry names extracted, in archive order.
pub fn unpack(archive: &Path, dir: &Path, wanted: &[&str]) -> StoreResult<Vec<String>> {
    fs::create_dir_all(dir)?;
    let mut reader = BufReader::new(File::open(archive)?);
    if reader.fill_buf()?.starts_with(ZIP_MAGIC) {
        return Err(StoreError::archive(format!(
            "{} is a zip container; only .tar.zst archives written by `gitmv export` can be imported",
            archive.display()
        )));
    }
    let decoder = zstd::Decoder::with_buffer(reader)
        .map_err(|e| StoreError::compression(format!("zstd decoder: {e}")))?;
    let mut tar = Archive::new(decoder);

    let mut names = Vec::new();
    let entries = tar
        .entries()
        .map_err(|e| StoreError::archive(format!("read entries: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| StoreError::archive(format!("read entry: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| StoreError::archive(format!("entry path: {e}")))?
            .into_owned();
        if !is_safe_relative(&path) {
            return Err(StoreError::UnsafeEntry(path.display().to_string()));
        }
        let name = path.to_string_lossy().replace('\\', "/");
        let name = name.trim_start_matches("./").to_string();
        if !wanted.contains(&name.as_str()) {
            debug!(entry = %name, "skipping unknown archive entry");
            continue;
        }

        let target = dir.join(&name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut entry, &mut out)?;
        out.flush()?;
        names.push(name);
    }
    debug!(archive = %archive.display(), entries = names.len(), "archive extracted");
    Ok(names)
}

fn is_safe_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_preserves_entries() {
        let src = tempfile::tempdir().unwrap();
        let bundle = src.path().join("a.bundle");
        let meta = src.path().join("m.json");
        fs::write(&bundle, vec![7u8; 200_000]).unwrap();
        fs::write(&meta, br#"{"branches":["main"]}"#).unwrap();

        let out = tempfile::tempdir().unwrap();
        let archive = out.path().join("nested/git-export.tar.zst");
        let size = pack(
            &[
                ("repository.bundle", bundle.as_path()),
                ("metadata.json", meta.as_path()),
                ("notes/extra.txt", meta.as_path()),
            ],
            &archive,
        )
        .unwrap();
        assert!(size > 0);
        assert!(size < 200_000, "repetitive payload should compress");
        assert!(!archive.with_extension("tmp").exists());

        let dest = tempfile::tempdir().unwrap();
        let names = unpack(&archive, dest.path(), &["repository.bundle", "metadata.json"]).unwrap();
        assert_eq!(names, vec!["repository.bundle", "metadata.json"]);
        assert!(!dest.path().join("notes").exists());
        assert_eq!(
            fs::read(dest.path().join("repository.bundle")).unwrap(),
            vec![7u8; 200_000]
        );
        assert_eq!(
            fs::read(dest.path().join("metadata.json")).unwrap(),
            br#"{"branches":["main"]}"#
        );
    }

    #[test]
    fn pack_with_missing_source_leaves_nothing_behind() {
        let out = tempfile::tempdir().unwrap();
        let archive = out.path().join("x.tar.zst");
        let missing = out.path().join("does-not-exist");
        assert!(pack(&[("repository.bundle", missing.as_path())], &archive).is_err());
        assert!(!archive.exists());
        assert!(!archive.with_extension("tmp").exists());
    }

    #[test]
    fn unpack_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.tar.zst");
        fs::write(&bogus, b"this is not an archive").unwrap();
        let err = unpack(&bogus, &dir.path().join("out"), &["metadata.json"]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Compression(_) | StoreError::Archive(_) | StoreError::Io(_)
        ));
    }

    #[test]
    fn unpack_names_zip_containers() {
        let dir = tempfile::tempdir().unwrap();
        let zipped = dir.path().join("git-export-20250101-000000.zip");
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        fs::write(&zipped, bytes).unwrap();

        let err = unpack(&zipped, &dir.path().join("out"), &["metadata.json"]).unwrap_err();
        match err {
            StoreError::Archive(msg) => {
                assert!(msg.contains("zip"));
                assert!(msg.contains(".tar.zst"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn safe_path_check() {
        assert!(is_safe_relative(Path::new("metadata.json")));
        assert!(is_safe_relative(Path::new("./a/b")));
        assert!(!is_safe_relative(Path::new("../escape")));
        assert!(!is_safe_relative(Path::new("/etc/passwd")));
        assert!(!is_safe_relative(Path::new("")));
    }
}
