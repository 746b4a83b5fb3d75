use crate::scp::{FileInfos, ScpError};
use chrono::{DateTime, Utc};
use std::fs::{self, File, FileTimes, Metadata, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn local_error(path: &Path, source: std::io::Error) -> ScpError {
    ScpError::LocalFile {
        path: path.display().to_string(),
        source,
    }
}

/// Stats a local file or directory into the metadata scp sends for it.
pub fn file_infos(path: &Path, preserve_times: bool) -> Result<FileInfos, ScpError> {
    let metadata = fs::metadata(path).map_err(|e| local_error(path, e))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            local_error(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no usable file name",
                ),
            )
        })?;

    let size = if metadata.is_dir() { 0 } else { metadata.len() };
    let infos = FileInfos::new(filename, &FileInfos::mode_string(mode(&metadata)), size);
    if !preserve_times {
        return Ok(infos);
    }

    let access_time = metadata.accessed().map(unix_seconds).unwrap_or(0);
    let modify_time = metadata.modified().map(unix_seconds).unwrap_or(0);
    Ok(infos.with_times(access_time, modify_time))
}

pub fn open_file(path: &Path) -> Result<File, ScpError> {
    File::open(path).map_err(|e| local_error(path, e))
}

pub fn create_file(path: &Path) -> Result<File, ScpError> {
    File::create(path).map_err(|e| local_error(path, e))
}

/// Where an incoming file lands: inside `target` when it is a directory,
/// otherwise `target` itself.
pub fn destination_path(target: &Path, infos: &FileInfos) -> PathBuf {
    if target.is_dir() {
        target.join(&infos.filename)
    } else {
        target.to_path_buf()
    }
}

/// Applies the received mode and, when asked, the access/modify times.
pub fn apply_metadata(path: &Path, infos: &FileInfos, preserve_times: bool) -> Result<(), ScpError> {
    if preserve_times && infos.has_times() {
        let mut times = FileTimes::new();
        if let Some(accessed) = system_time(infos.access_time) {
            times = times.set_accessed(accessed);
        }
        if let Some(modified) = system_time(infos.modify_time) {
            times = times.set_modified(modified);
        }
        OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_times(times))
            .map_err(|e| local_error(path, e))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = infos.mode() {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
                .map_err(|e| local_error(path, e))?;
        }
    }

    Ok(())
}

pub fn unix_seconds(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp()
}

pub fn system_time(seconds: i64) -> Option<SystemTime> {
    if seconds == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(seconds, 0).map(SystemTime::from)
}

#[cfg(unix)]
fn mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}
