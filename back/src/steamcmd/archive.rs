use std::{
    fs::{self, File},
    io,
    path::Path,
};

use flate2::read::GzDecoder;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::error::ArchiveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Guess the format from the file name at the end of a URL or path
    pub fn from_name(name: &str) -> Result<Self, ArchiveError> {
        let lower = name.to_lowercase();

        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else {
            Err(ArchiveError::Unsupported(name.to_string()))
        }
    }
}

/// Extract `archive` into `dest_dir`, reporting `(done, total)` entries as it goes
#[instrument(skip(on_progress))]
pub fn extract(
    archive: &Path,
    dest_dir: &Path,
    format: ArchiveFormat,
    mut on_progress: impl FnMut(u64, u64),
) -> Result<(), ArchiveError> {
    fs::create_dir_all(dest_dir)?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest_dir, &mut on_progress),
        ArchiveFormat::TarGz => {
            // Entry counts are unknown up front for a compressed tarball
            on_progress(0, 1);
            let mut tarball = tar::Archive::new(GzDecoder::new(File::open(archive)?));
            tarball.set_preserve_permissions(true);
            tarball.unpack(dest_dir)?;
            on_progress(1, 1);
            Ok(())
        }
    }
}

fn extract_zip(archive: &Path, dest_dir: &Path, on_progress: &mut impl FnMut(u64, u64)) -> Result<(), ArchiveError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;

    let total = zip.len() as u64;
    on_progress(0, total);

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;

        // Entries pointing outside of the destination are skipped
        let Some(relative) = entry.enclosed_name().map(|path| path.to_owned()) else {
            warn!(name = entry.name(), "Skipping archive entry with an unsafe path");
            on_progress(index as u64 + 1, total);
            continue;
        };

        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out_file = File::create(&out_path)?;
            io::copy(&mut entry, &mut out_file)?;
            debug!(path = %out_path.display(), "Extracted");

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
            }
        }

        on_progress(index as u64 + 1, total);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for (name, contents) in files {
            writer
                .start_file(*name, SimpleFileOptions::default().unix_permissions(0o755))
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }

        let bytes = writer.finish().unwrap().into_inner();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn format_from_name() {
        assert_eq!(ArchiveFormat::from_name("steamcmd.zip").unwrap(), ArchiveFormat::Zip);
        assert_eq!(
            ArchiveFormat::from_name("steamcmd_linux.tar.gz").unwrap(),
            ArchiveFormat::TarGz
        );
        assert!(ArchiveFormat::from_name("steamcmd.dmg").is_err());
    }

    #[test]
    fn extracts_zip_and_reports_every_entry() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("steamcmd.zip");
        write_zip(&archive, &[("steamcmd.exe", "binary"), ("package/readme.txt", "hi")]);

        let dest = tmp.path().join("SteamCMD");
        let mut reports = Vec::new();
        extract(&archive, &dest, ArchiveFormat::Zip, |done, total| reports.push((done, total))).unwrap();

        assert_eq!(fs::read_to_string(dest.join("steamcmd.exe")).unwrap(), "binary");
        assert_eq!(fs::read_to_string(dest.join("package/readme.txt")).unwrap(), "hi");
        assert_eq!(reports, vec![(0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn skips_entries_escaping_the_destination() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.zip");
        write_zip(&archive, &[("../escaped.txt", "nope"), ("steamcmd.exe", "binary")]);

        let dest = tmp.path().join("SteamCMD");
        extract(&archive, &dest, ArchiveFormat::Zip, |_, _| {}).unwrap();

        assert!(!tmp.path().join("escaped.txt").exists());
        assert!(dest.join("steamcmd.exe").exists());
    }

    #[test]
    fn corrupt_zip_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let result = extract(&archive, &tmp.path().join("out"), ArchiveFormat::Zip, |_, _| {});

        assert!(matches!(result, Err(ArchiveError::Zip(_))));
    }
}
