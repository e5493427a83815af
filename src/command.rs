//! Turns command lines such as `mkfile notes/todo buy milk` into calls on a [`FileSystem`].

use std::fmt;

use crate::disk_format::inode::InodeType;
use crate::error::{FsError, Result};
use crate::lfs::FileSystem;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    MakeDirectory(String),
    RemoveDirectory(String),
    MakeFile { path: String, content: String },
    RemoveFile(String),
    Move { source: String, destination: String },
    Read(String),
    List(Option<String>),
    /// `None` changes to the root.
    ChangeDirectory(Option<String>),
    PrintWorkingDirectory,
}

/// What a successfully executed command produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    None,
    Text(String),
    Listing(Vec<(String, InodeType)>),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Output::None => Ok(()),
            Output::Text(text) => write!(f, "{text}"),
            Output::Listing(entries) => {
                let rendered = entries
                    .iter()
                    .map(|(name, type_)| match type_ {
                        InodeType::Directory => format!("{name}/"),
                        _ => name.clone(),
                    })
                    .collect::<Vec<_>>();

                write!(f, "{}", rendered.join(" "))
            }
        }
    }
}

impl Command {
    /// Parses a whitespace-separated command line. Blank lines and lines starting with `#`
    /// yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };

        if name.starts_with('#') {
            return Ok(None);
        }

        let operands = tokens.collect::<Vec<_>>();

        let command = match name {
            "mkdir" => Command::MakeDirectory(exactly_one(name, &operands)?),
            "rmdir" => Command::RemoveDirectory(exactly_one(name, &operands)?),
            "rm" => Command::RemoveFile(exactly_one(name, &operands)?),
            "cat" => Command::Read(exactly_one(name, &operands)?),
            "ls" => Command::List(at_most_one(name, &operands)?),
            "cd" => Command::ChangeDirectory(at_most_one(name, &operands)?),
            "pwd" => {
                at_most_none(name, &operands)?;
                Command::PrintWorkingDirectory
            }
            "mkfile" => match operands.as_slice() {
                [path, content @ ..] if !content.is_empty() => Command::MakeFile {
                    path: (*path).to_owned(),
                    content: content.join(" "),
                },
                _ => return Err(invalid(name, "expected a path followed by content")),
            },
            "mv" => match operands.as_slice() {
                [source, destination] => Command::Move {
                    source: (*source).to_owned(),
                    destination: (*destination).to_owned(),
                },
                _ => return Err(invalid(name, "expected a source and a destination")),
            },
            _ => {
                return Err(FsError::InvalidOperation(format!(
                    "unknown command: {name}"
                )))
            }
        };

        Ok(Some(command))
    }

    pub fn execute<F: FileSystem + ?Sized>(&self, fs: &mut F) -> Result<Output> {
        let output = match self {
            Command::MakeDirectory(path) => {
                fs.make_directory(path)?;
                Output::None
            }
            Command::RemoveDirectory(path) => {
                fs.remove_directory(path)?;
                Output::None
            }
            Command::MakeFile { path, content } => {
                fs.make_file(path, content.as_bytes())?;
                Output::None
            }
            Command::RemoveFile(path) => {
                fs.remove_file(path)?;
                Output::None
            }
            Command::Move {
                source,
                destination,
            } => {
                fs.move_entry(source, destination)?;
                Output::None
            }
            Command::Read(path) => Output::Text(fs.read(path)?),
            Command::List(path) => Output::Listing(fs.list(path.as_deref())?),
            Command::ChangeDirectory(path) => {
                fs.change_directory(path.as_deref().unwrap_or("/"))?;
                Output::None
            }
            Command::PrintWorkingDirectory => Output::Text(fs.current_path()),
        };

        Ok(output)
    }
}

fn invalid(command: &str, reason: &str) -> FsError {
    FsError::InvalidOperation(format!("{command}: {reason}"))
}

fn exactly_one(command: &str, operands: &[&str]) -> Result<String> {
    match operands {
        [operand] => Ok((*operand).to_owned()),
        [] => Err(invalid(command, "missing operand")),
        _ => Err(invalid(command, "too many operands")),
    }
}

fn at_most_one(command: &str, operands: &[&str]) -> Result<Option<String>> {
    match operands {
        [] => Ok(None),
        [operand] => Ok(Some((*operand).to_owned())),
        _ => Err(invalid(command, "too many operands")),
    }
}

fn at_most_none(command: &str, operands: &[&str]) -> Result<()> {
    if operands.is_empty() {
        Ok(())
    } else {
        Err(invalid(command, "takes no operands"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lfs::LinkedFs;

    fn run(fs: &mut LinkedFs, line: &str) -> Result<Output> {
        match Command::parse(line)? {
            Some(command) => command.execute(fs),
            None => Ok(Output::None),
        }
    }

    mod parse {
        use super::*;

        #[test]
        fn test_blank_and_comment_lines() {
            assert_eq!(Command::parse("").unwrap(), None);
            assert_eq!(Command::parse("   \t").unwrap(), None);
            assert_eq!(Command::parse("# mkdir a").unwrap(), None);
        }

        #[test]
        fn test_mkfile_joins_content() {
            assert_eq!(
                Command::parse("mkfile notes/todo buy   some milk").unwrap(),
                Some(Command::MakeFile {
                    path: "notes/todo".to_owned(),
                    content: "buy some milk".to_owned(),
                })
            );
        }

        #[test]
        fn test_optional_operands() {
            assert_eq!(Command::parse("ls").unwrap(), Some(Command::List(None)));
            assert_eq!(
                Command::parse("ls /a").unwrap(),
                Some(Command::List(Some("/a".to_owned())))
            );
            assert_eq!(
                Command::parse("cd").unwrap(),
                Some(Command::ChangeDirectory(None))
            );
        }

        #[test]
        fn test_wrong_operand_counts() {
            for line in [
                "mkdir",
                "mkdir a b",
                "rmdir",
                "rm",
                "cat",
                "mkfile",
                "mkfile path",
                "mv a",
                "mv a b c",
                "ls a b",
                "pwd /",
            ] {
                assert!(
                    matches!(Command::parse(line), Err(FsError::InvalidOperation(_))),
                    "{line:?}"
                );
            }
        }

        #[test]
        fn test_unknown_command() {
            assert!(matches!(
                Command::parse("format c:"),
                Err(FsError::InvalidOperation(_))
            ));
        }
    }

    mod execute {
        use super::*;

        #[test]
        fn test_session() {
            let mut fs = LinkedFs::new(64, 32).unwrap();

            for line in [
                "mkdir dir1",
                "mkdir dir2",
                "mkfile dir1/f hello world",
                "mv dir1/f dir2",
                "cd dir2",
            ] {
                assert_eq!(run(&mut fs, line).unwrap(), Output::None, "{line}");
            }

            assert_eq!(
                run(&mut fs, "cat f").unwrap(),
                Output::Text("hello world".to_owned())
            );
            assert_eq!(
                run(&mut fs, "pwd").unwrap(),
                Output::Text("/dir2".to_owned())
            );
            assert_eq!(
                run(&mut fs, "ls /").unwrap().to_string(),
                "dir1/ dir2/"
            );

            run(&mut fs, "cd").unwrap();
            assert_eq!(fs.current_path(), "/");
            fs.check_filesystem().unwrap();
        }

        #[test]
        fn test_errors_are_reported() {
            let mut fs = LinkedFs::new(64, 32).unwrap();

            assert_eq!(
                run(&mut fs, "cat missing"),
                Err(FsError::PathNotFound("missing".to_owned()))
            );
            assert_eq!(
                run(&mut fs, "cd missing"),
                Err(FsError::PathNotFound("missing".to_owned()))
            );
            assert_eq!(run(&mut fs, "rmdir /"), Err(FsError::RootDirectory));
        }

        #[test]
        fn test_listing_display() {
            let output = Output::Listing(vec![
                ("a".to_owned(), InodeType::Regular),
                ("b".to_owned(), InodeType::Directory),
            ]);

            assert_eq!(output.to_string(), "a b/");
            assert_eq!(Output::None.to_string(), "");
        }
    }
}
