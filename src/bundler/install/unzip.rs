//! Archive extraction into staging directories.

use crate::bundler::error::InstallError;
use crate::bundler::utils::fs::remove_dir_all_blocking;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Unzips `archive` into `staging`.
///
/// On failure the partially written staging directory is removed so the
/// archive is retried on the next install.
pub(super) fn unzip(archive: &Path, staging: &Path) -> Result<(), InstallError> {
    let extracted = (|| -> zip::result::ZipResult<usize> {
        let file = File::open(archive)?;
        let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
        std::fs::create_dir_all(staging)?;
        zip.extract(staging)?;
        Ok(zip.len())
    })();

    match extracted {
        Ok(entries) => {
            log::debug!(
                "Extracted {} entries from {} into {}",
                entries,
                archive.display(),
                staging.display()
            );
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = remove_dir_all_blocking(staging) {
                log::warn!(
                    "Failed to remove partial staging dir {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            Err(InstallError::Unzip {
                archive: archive.to_path_buf(),
                staging: staging.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}
