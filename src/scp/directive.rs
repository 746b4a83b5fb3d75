use super::constants::*;
use super::error::DirectiveParseError;
use super::response::Response;

/// Metadata of one file as carried by the permission and time directives.
///
/// The two directives travel as separate lines, so a record is built from the
/// first one and then folded with [`FileInfos::update`] as the second arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfos {
    pub message: String,
    pub filename: String,
    pub permissions: String,
    pub size: u64,
    pub access_time: i64,
    pub modify_time: i64,
}

impl FileInfos {
    pub fn new(filename: &str, permissions: &str, size: u64) -> Self {
        FileInfos {
            filename: filename.to_string(),
            permissions: permissions.to_string(),
            size,
            ..Default::default()
        }
    }

    pub fn with_times(self, access_time: i64, modify_time: i64) -> Self {
        FileInfos {
            access_time,
            modify_time,
            ..self
        }
    }

    /// Formats a Unix mode as the four octal digits scp puts on the wire.
    pub fn mode_string(mode: u32) -> String {
        format!("{:04o}", mode & 0o7777)
    }

    pub fn mode(&self) -> Option<u32> {
        u32::from_str_radix(&self.permissions, 8).ok()
    }

    pub fn has_times(&self) -> bool {
        self.access_time != 0 || self.modify_time != 0
    }

    /// Returns a copy where every field `new` actually carries (non-empty,
    /// non-zero) replaces ours. Fields left at their default never clobber.
    pub fn update(&self, new: &FileInfos) -> FileInfos {
        FileInfos {
            message: pick_string(&self.message, &new.message),
            filename: pick_string(&self.filename, &new.filename),
            permissions: pick_string(&self.permissions, &new.permissions),
            size: if new.size != 0 { new.size } else { self.size },
            access_time: if new.access_time != 0 {
                new.access_time
            } else {
                self.access_time
            },
            modify_time: if new.modify_time != 0 {
                new.modify_time
            } else {
                self.modify_time
            },
        }
    }

    /// Parses `<mode> <size> <filename>`, with or without the leading `C`.
    ///
    /// Filenames are not escaped by the protocol: a name containing a space is
    /// cut at the first space.
    pub fn from_permission_message(message: &str) -> Result<Self, DirectiveParseError> {
        let line = message.replace('\n', "");
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() < 3 {
            return Err(DirectiveParseError::Permission);
        }

        let permissions = parts[0]
            .strip_prefix(SCP_PERMISSION as char)
            .unwrap_or(parts[0]);
        if permissions.is_empty() || !permissions.chars().all(|c| ('0'..='7').contains(&c)) {
            return Err(DirectiveParseError::Permission);
        }

        let size: u64 = parts[1]
            .parse()
            .map_err(|_| DirectiveParseError::Permission)?;

        let filename = parts[2];
        if filename.is_empty() || filename == ".." || filename.contains('/') {
            return Err(DirectiveParseError::Permission);
        }

        Ok(FileInfos {
            message: message.to_string(),
            filename: filename.to_string(),
            permissions: permissions.to_string(),
            size,
            ..Default::default()
        })
    }

    /// Parses `<atime> 0 <mtime> 0`, with or without the leading `T`.
    pub fn from_time_message(message: &str) -> Result<Self, DirectiveParseError> {
        let line = message.replace('\n', "");
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() < 3 {
            return Err(DirectiveParseError::Time);
        }

        let access_time: i64 = parts[0]
            .strip_prefix(SCP_TIME as char)
            .unwrap_or(parts[0])
            .parse()
            .map_err(|_| DirectiveParseError::AccessTime)?;
        let modify_time: i64 = parts[2]
            .parse()
            .map_err(|_| DirectiveParseError::ModifyTime)?;

        Ok(FileInfos {
            message: message.to_string(),
            access_time,
            modify_time,
            ..Default::default()
        })
    }

    pub fn permission_line(&self) -> String {
        format!(
            "{}{} {} {}\n",
            SCP_PERMISSION as char, self.permissions, self.size, self.filename
        )
    }

    pub fn time_line(&self) -> String {
        format!(
            "{}{} 0 {} 0\n",
            SCP_TIME as char, self.access_time, self.modify_time
        )
    }

    pub fn enter_directory_line(&self) -> String {
        format!(
            "{}{} 0 {}\n",
            SCP_ENTER_DIRECTORY as char, self.permissions, self.filename
        )
    }

    pub fn exit_directory_line() -> String {
        format!("{}\n", SCP_EXIT_DIRECTORY as char)
    }
}

fn pick_string(current: &str, new: &str) -> String {
    if new.is_empty() {
        current.to_string()
    } else {
        new.to_string()
    }
}

impl Response {
    pub fn parse_file_infos(&self) -> Result<FileInfos, DirectiveParseError> {
        FileInfos::from_permission_message(self.message())
    }

    pub fn parse_file_time(&self) -> Result<FileInfos, DirectiveParseError> {
        FileInfos::from_time_message(self.message())
    }
}
