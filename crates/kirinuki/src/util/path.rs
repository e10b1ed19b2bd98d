use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    sync::LazyLock,
};

use regex::Regex;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-_.]").expect("valid regex"));

pub trait KirinukiPathExt {
    /// Add suffix to file name without changing extension.
    ///
    /// Note this function does not handle multiple suffixes.
    /// For example, `test.tar.gz` with `_suffix` will be `test.tar_suffix.gz`.
    fn add_suffix<T: AsRef<OsStr>>(&mut self, suffix: T);

    /// Returns a copy of the path with the suffix added.
    fn with_suffix<T: AsRef<OsStr>>(&self, suffix: T) -> PathBuf;
}

impl KirinukiPathExt for PathBuf {
    fn add_suffix<T: AsRef<OsStr>>(&mut self, suffix: T) {
        let mut filename = OsString::new();

        // {file_stem}_{suffix}.{ext}
        if let Some(file_stem) = self.file_stem() {
            filename.push(file_stem);
        }
        filename.push("_");
        filename.push(suffix);

        if let Some(ext) = self.extension() {
            filename.push(".");
            filename.push(ext);
        }

        self.set_file_name(filename);
    }

    fn with_suffix<T: AsRef<OsStr>>(&self, suffix: T) -> PathBuf {
        let mut path = self.clone();
        path.add_suffix(suffix);
        path
    }
}

/// Turn user input into a flat `.mp4` file name.
///
/// Directory components are dropped and every character that is not a word
/// character (Unicode letters and digits included), `_`, `-` or `.` is
/// replaced with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let mut sanitized = UNSAFE_FILENAME_CHARS
        .replace_all(basename, "_")
        .into_owned();
    if !sanitized.to_lowercase().ends_with(".mp4") {
        sanitized.push_str(".mp4");
    }
    sanitized
}
