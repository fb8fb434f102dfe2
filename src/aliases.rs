//! Folder and file aliases for `stage set`.
//!
//! The alias file is line-oriented:
//!
//! ```text
//! PathAlias clients
//! Path ~/Documents/Clients
//! FileAlias acme
//! FilePath ~/Documents/Clients/acme-form.xlsx
//! ```
//!
//! A `FileAlias` belongs to the most recent `PathAlias`. Only the file name of
//! a `FilePath` is used; it is joined onto the folder's `Path`.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::config::expand_home;

/// Errors that can occur loading an alias file.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("failed to read alias file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("alias file line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A folder alias and the file aliases declared under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Folder {
    path: Option<String>,
    files: BTreeMap<String, Option<String>>,
}

/// Parsed alias definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    folders: BTreeMap<String, Folder>,
}

impl Aliases {
    /// Load and parse an alias file.
    pub fn load(path: &Path) -> Result<Self, AliasError> {
        let contents = fs::read_to_string(path).map_err(|source| AliasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse alias definitions. Blank lines and `#` comments are ignored.
    pub fn parse(contents: &str) -> Result<Self, AliasError> {
        let mut aliases = Self::default();
        let mut current_folder: Option<String> = None;
        let mut current_file: Option<String> = None;

        for (index, raw) in contents.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (directive, argument) = match trimmed.split_once(char::is_whitespace) {
                Some((d, a)) => (d, a.trim()),
                None => (trimmed, ""),
            };
            if argument.is_empty() {
                return Err(parse_error(line, format!("{directive} needs a value")));
            }

            match directive {
                "PathAlias" => {
                    aliases
                        .folders
                        .insert(argument.to_string(), Folder::default());
                    current_folder = Some(argument.to_string());
                    current_file = None;
                }
                "Path" => {
                    let folder = folder_mut(&mut aliases, current_folder.as_deref())
                        .ok_or_else(|| parse_error(line, "Path defined before PathAlias"))?;
                    folder.path = Some(argument.to_string());
                }
                "FileAlias" => {
                    let folder = folder_mut(&mut aliases, current_folder.as_deref())
                        .ok_or_else(|| parse_error(line, "FileAlias defined before PathAlias"))?;
                    folder.files.insert(argument.to_string(), None);
                    current_file = Some(argument.to_string());
                }
                "FilePath" => {
                    let (Some(folder), Some(file)) = (
                        folder_mut(&mut aliases, current_folder.as_deref()),
                        current_file.as_ref(),
                    ) else {
                        return Err(parse_error(
                            line,
                            "FilePath defined before FileAlias or PathAlias",
                        ));
                    };
                    folder
                        .files
                        .insert(file.clone(), Some(argument.to_string()));
                }
                other => {
                    return Err(parse_error(line, format!("unknown directive '{other}'")));
                }
            }
        }

        Ok(aliases)
    }

    /// The folder path for a folder alias, with `~` expanded.
    pub fn folder_path(&self, folder: &str) -> Option<PathBuf> {
        self.folders
            .get(folder)?
            .path
            .as_deref()
            .map(expand_home)
    }

    /// The full path for a file alias: the folder path joined with the file's name.
    pub fn file_path(&self, folder: &str, file: &str) -> Option<PathBuf> {
        let folder_path = self.folder_path(folder)?;
        let declared = self.folders.get(folder)?.files.get(file)?.as_deref()?;
        let name = Path::new(declared).file_name()?;
        Some(folder_path.join(name))
    }
}

fn folder_mut<'a>(aliases: &'a mut Aliases, name: Option<&str>) -> Option<&'a mut Folder> {
    aliases.folders.get_mut(name?)
}

fn parse_error(line: usize, message: impl Into<String>) -> AliasError {
    AliasError::Parse {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
# Client folders
PathAlias clients
Path /srv/clients
FileAlias acme
FilePath /elsewhere/acme-form.xlsx
FileAlias globex
FilePath globex.csv

PathAlias archive
Path /srv/archive
";

    #[test]
    fn resolves_folder_and_file_aliases() {
        let aliases = Aliases::parse(SAMPLE).unwrap();

        assert_eq!(
            aliases.folder_path("clients"),
            Some(PathBuf::from("/srv/clients"))
        );
        assert_eq!(
            aliases.file_path("clients", "acme"),
            Some(PathBuf::from("/srv/clients/acme-form.xlsx"))
        );
        assert_eq!(
            aliases.file_path("clients", "globex"),
            Some(PathBuf::from("/srv/clients/globex.csv"))
        );
        assert_eq!(
            aliases.folder_path("archive"),
            Some(PathBuf::from("/srv/archive"))
        );
    }

    #[test]
    fn file_alias_belongs_to_latest_folder() {
        let aliases = Aliases::parse(SAMPLE).unwrap();
        assert_eq!(aliases.file_path("archive", "acme"), None);
    }

    #[test]
    fn unknown_aliases_resolve_to_none() {
        let aliases = Aliases::parse(SAMPLE).unwrap();
        assert_eq!(aliases.folder_path("nope"), None);
        assert_eq!(aliases.file_path("clients", "nope"), None);
    }

    #[test]
    fn file_alias_without_path_resolves_to_none() {
        let aliases = Aliases::parse("PathAlias a\nPath /a\nFileAlias f\n").unwrap();
        assert_eq!(aliases.file_path("a", "f"), None);
    }

    #[test]
    fn path_before_path_alias_is_an_error() {
        let err = Aliases::parse("Path /srv\nPathAlias a\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 1, .. }));
    }

    #[test]
    fn file_alias_before_path_alias_is_an_error() {
        let err = Aliases::parse("\nFileAlias f\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 2, .. }));
    }

    #[test]
    fn file_path_before_file_alias_is_an_error() {
        let err = Aliases::parse("PathAlias a\nFilePath x.csv\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 2, .. }));
    }

    #[test]
    fn file_path_does_not_carry_across_folders() {
        let err =
            Aliases::parse("PathAlias a\nFileAlias f\nPathAlias b\nFilePath x.csv\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 4, .. }));
    }

    #[test]
    fn unknown_directive_is_an_error() {
        let err = Aliases::parse("PathAlias a\nPaths /x\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 2, .. }));
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = Aliases::parse("PathAlias\n").unwrap_err();
        assert!(matches!(err, AliasError::Parse { line: 1, .. }));
    }
}
