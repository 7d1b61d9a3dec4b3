//! Directory ⇄ zip archive codec
//!
//! Entry names are always relative to the packed directory and use forward
//! slashes. Empty directories are written as explicit directory entries so a
//! round trip reproduces them even without a marker file inside.

use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{InterchangeError, InterchangeResult};

/// Pack a directory into an in-memory archive
pub fn pack(source_dir: &Path) -> InterchangeResult<Vec<u8>> {
    let cursor = pack_into(source_dir, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Pack a directory into an archive file at `dest`
///
/// A failure can leave a partial file behind; callers treat any error as
/// "no archive produced".
pub fn pack_to_file(source_dir: &Path, dest: &Path) -> InterchangeResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    let file = File::create(dest).map_err(|e| write_error(dest, e))?;
    let mut file = pack_into(source_dir, file)?;
    file.flush().map_err(|e| write_error(dest, e))?;
    debug!(archive = %dest.display(), "archive written");
    Ok(())
}

/// Pack a directory into any seekable writer, returning the writer when done
pub fn pack_into<W: Write + Seek>(source_dir: &Path, writer: W) -> InterchangeResult<W> {
    if !source_dir.is_dir() {
        return Err(InterchangeError::ArchiveWrite(format!(
            "{} is not a directory",
            source_dir.display()
        )));
    }

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| InterchangeError::ArchiveWrite(e.to_string()))?;
        let path = entry.path();
        let name = entry_name(source_dir, path)?;

        if entry.file_type().is_dir() {
            if is_empty_dir(path)? {
                zip.add_directory(format!("{}/", name), options)
                    .map_err(|e| InterchangeError::ArchiveWrite(e.to_string()))?;
            }
            continue;
        }

        zip.start_file(name, options)
            .map_err(|e| InterchangeError::ArchiveWrite(e.to_string()))?;
        let mut input = File::open(path).map_err(|e| write_error(path, e))?;
        io::copy(&mut input, &mut zip).map_err(|e| write_error(path, e))?;
    }

    zip.finish()
        .map_err(|e| InterchangeError::ArchiveWrite(e.to_string()))
}

/// Unpack an in-memory archive into `dest_dir`
pub fn unpack(archive: &[u8], dest_dir: &Path) -> InterchangeResult<()> {
    unpack_from(Cursor::new(archive), dest_dir)
}

/// Unpack an archive file into `dest_dir`
pub fn unpack_file(archive_path: &Path, dest_dir: &Path) -> InterchangeResult<()> {
    let file = File::open(archive_path).map_err(|e| {
        InterchangeError::ArchiveRead(format!("Failed to open {}: {}", archive_path.display(), e))
    })?;
    unpack_from(BufReader::new(file), dest_dir)
}

/// Unpack an archive from any seekable reader
///
/// Entries are processed in container order; existing files are overwritten.
pub fn unpack_from<R: Read + Seek>(reader: R, dest_dir: &Path) -> InterchangeResult<()> {
    let mut archive = ZipArchive::new(reader)?;
    fs::create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                warn!(entry = entry.name(), "skipping archive entry outside destination");
                continue;
            }
        };
        let target = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output).map_err(|e| {
            InterchangeError::ArchiveRead(format!("Failed to extract {}: {}", entry.name(), e))
        })?;
    }

    Ok(())
}

/// Check whether an archive holds `entry_prefix` as a file or as a directory
///
/// Unreadable archives report `false`.
pub fn contains(archive_path: &Path, entry_prefix: &str) -> bool {
    let Ok(file) = File::open(archive_path) else {
        return false;
    };
    let Ok(archive) = ZipArchive::new(BufReader::new(file)) else {
        return false;
    };

    let prefix = entry_prefix.trim_end_matches('/');
    let nested = format!("{}/", prefix);
    let found = archive
        .file_names()
        .any(|name| name == prefix || name.starts_with(&nested));
    found
}

fn entry_name(root: &Path, path: &Path) -> InterchangeResult<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        InterchangeError::ArchiveWrite(format!("{} escapes {}", path.display(), root.display()))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn is_empty_dir(path: &Path) -> InterchangeResult<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| write_error(path, e))?;
    Ok(entries.next().is_none())
}

fn write_error(path: &Path, err: io::Error) -> InterchangeError {
    InterchangeError::ArchiveWrite(format!("{}: {}", path.display(), err))
}
