//! Archive extraction for downloaded Heim releases.
//!
//! Windows builds ship as ZIP, everything else as tar.gz. Both extractors
//! keep the archive layout exactly as packed (the vendor archive carries a
//! top-level `heim/` directory that the install paths rely on) and refuse
//! entries that would land outside the destination directory.

use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::{Result, SetupError};

/// Rejects absolute paths and `..` components.
fn ensure_relative(archive_path: &Path, entry_path: &Path) -> Result<()> {
    if entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(SetupError::extraction_failed(
            archive_path,
            format!(
                "refusing to extract path with parent directory or absolute reference: {}",
                entry_path.display()
            ),
        ));
    }
    Ok(())
}

/// Extracts a ZIP archive into `dest_dir`, creating it if needed.
///
/// Unix permission bits stored in the archive are restored.
///
/// # Errors
///
/// Returns [`SetupError::ExtractionFailed`] if the archive cannot be read, an
/// entry escapes the destination, or a file cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let fail = |message: String| SetupError::extraction_failed(archive_path, message);

    let file = std::fs::File::open(archive_path)
        .map_err(|e| fail(format!("failed to open archive: {e}")))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| fail(format!("not a valid ZIP archive: {e}")))?;

    std::fs::create_dir_all(dest_dir)
        .map_err(|e| fail(format!("failed to create {}: {e}", dest_dir.display())))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| fail(format!("failed to read entry {i}: {e}")))?;

        let entry_path = entry
            .enclosed_name()
            .ok_or_else(|| fail(format!("invalid entry path: {}", entry.name())))?;
        ensure_relative(archive_path, &entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| fail(format!("failed to create {}: {e}", output_path.display())))?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| fail(format!("failed to create {}: {e}", parent.display())))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .map_err(|e| fail(format!("failed to create {}: {e}", output_path.display())))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| fail(format!("failed to extract {}: {e}", output_path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let permissions = std::fs::Permissions::from_mode(mode & 0o7777);
                std::fs::set_permissions(&output_path, permissions).map_err(|e| {
                    fail(format!(
                        "failed to set permissions on {}: {e}",
                        output_path.display()
                    ))
                })?;
            }
        }
    }

    Ok(())
}

/// Extracts a tar.gz archive into `dest_dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`SetupError::ExtractionFailed`] if the archive cannot be read, an
/// entry escapes the destination, or a file cannot be written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let fail = |message: String| SetupError::extraction_failed(archive_path, message);

    std::fs::create_dir_all(dest_dir)
        .map_err(|e| fail(format!("failed to create {}: {e}", dest_dir.display())))?;

    let file = std::fs::File::open(archive_path)
        .map_err(|e| fail(format!("failed to open archive: {e}")))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| fail(format!("failed to read tar entries: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| fail(format!("failed to read tar entry: {e}")))?;

        let entry_path = entry
            .path()
            .map_err(|e| fail(format!("failed to get entry path: {e}")))?
            .into_owned();
        ensure_relative(archive_path, &entry_path)?;

        // unpack_in also refuses writes that resolve outside dest_dir
        // through a symlink unpacked earlier from the same archive.
        let unpacked = entry
            .unpack_in(dest_dir)
            .map_err(|e| fail(format!("failed to extract {}: {e}", entry_path.display())))?;
        if !unpacked {
            return Err(fail(format!(
                "refusing to extract entry outside destination: {}",
                entry_path.display()
            )));
        }
    }

    Ok(())
}
