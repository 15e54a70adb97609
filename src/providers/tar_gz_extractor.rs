use std::fs::Permissions;
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use flate2::read::GzDecoder;
use log::debug;
use tempfile::NamedTempFile;

use crate::error::ExtractError;
use crate::providers::extractor::{ExtractOptions, Extractor};

/// Unpacks gzip-compressed tarballs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    async fn extract(
        &self,
        content: &Bytes,
        folder: &Path,
        options: Option<&ExtractOptions>,
    ) -> Result<(), ExtractError> {
        let content = content.clone();
        let folder = folder.to_path_buf();
        let strip_prefix = options.and_then(|options| options.strip_prefix.clone());

        // Decompression is CPU-bound, keep it off the runtime threads.
        tokio::task::spawn_blocking(move || unpack(&content, &folder, strip_prefix.as_deref()))
            .await?
    }
}

fn unpack(content: &[u8], folder: &Path, strip_prefix: Option<&str>) -> Result<(), ExtractError> {
    let mut archive = tar::Archive::new(GzDecoder::new(content));
    let entries = archive.entries().map_err(ExtractError::Corrupted)?;

    for entry in entries {
        let mut entry = entry.map_err(ExtractError::Corrupted)?;
        let original = entry.path().map_err(ExtractError::Corrupted)?.into_owned();

        let relative = match strip_prefix {
            Some(prefix) => match original.strip_prefix(prefix) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => {
                    debug!("skipping {} outside of {}", original.display(), prefix);
                    continue;
                }
            },
            None => original.clone(),
        };
        let outpath = join_inside(folder, &relative)?;
        if outpath == folder {
            continue;
        }

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|source| ExtractError::Io {
                path: outpath.clone(),
                source,
            })?;
        } else if entry_type.is_file() {
            write_member(&mut entry, &outpath)?;
        } else {
            debug!("skipping non-regular entry {}", original.display());
        }
    }
    Ok(())
}

/// Writes a regular member next to its final path and moves it into place
/// only once it is complete. A member cut short leaves nothing behind.
fn write_member<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    outpath: &Path,
) -> Result<(), ExtractError> {
    let parent = outpath.parent().unwrap_or(outpath);
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExtractError::Io { path, source }
    };
    std::fs::create_dir_all(parent).map_err(io_error(parent))?;

    let expected = entry.header().size().map_err(ExtractError::Corrupted)?;
    let mode = entry.header().mode().unwrap_or(0o644) & 0o777;

    let mut staged = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    let mut buffer = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let read = match entry.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExtractError::Corrupted(e)),
        };
        staged
            .write_all(&buffer[..read])
            .map_err(io_error(staged.path()))?;
        written += read as u64;
    }
    if written != expected {
        return Err(ExtractError::Corrupted(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{} ends after {} of {} bytes",
                outpath.display(),
                written,
                expected
            ),
        )));
    }

    staged
        .as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(io_error(staged.path()))?;
    staged.persist(outpath).map_err(|e| ExtractError::Io {
        path: outpath.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Joins an archive member path to `folder`, refusing anything that could land outside it.
fn join_inside(folder: &Path, entry: &Path) -> Result<PathBuf, ExtractError> {
    let mut outpath = folder.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Normal(part) => outpath.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath {
                    entry: entry.to_path_buf(),
                    folder: folder.to_path_buf(),
                });
            }
        }
    }
    Ok(outpath)
}
