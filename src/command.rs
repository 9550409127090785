//! Line-oriented commands that drive a [`Sheet`].
//!
//! One command per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! set A1 =B1+1
//! set B1 5
//! get A1
//! values
//! ```

use std::io::Write;
use std::str::FromStr;

use cellgraph_core::{Position, Sheet};
use log::{debug, warn};

use crate::error::{CommandError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Set { pos: Position, text: String },
    Clear(Position),
    Get(Position),
    Text(Position),
    Refs(Position),
    Size,
    Values,
    Texts,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_start();
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));

        let cell = |rest: &str| -> Result<(Position, String)> {
            let (cell, text) = rest.split_once(' ').unwrap_or((rest, ""));
            if cell.is_empty() {
                return Err(CommandError::MissingCell {
                    command: name.to_string(),
                });
            }
            let pos = cell.parse::<Position>().map_err(CommandError::BadCell)?;
            Ok((pos, text.to_string()))
        };
        let bare = |cmd: Command| -> Result<Command> {
            if rest.trim().is_empty() {
                Ok(cmd)
            } else {
                Err(CommandError::UnexpectedArgument {
                    command: name.to_string(),
                })
            }
        };

        match name {
            "set" => {
                let (pos, text) = cell(rest)?;
                Ok(Command::Set { pos, text })
            }
            "clear" => Ok(Command::Clear(cell(rest.trim())?.0)),
            "get" => Ok(Command::Get(cell(rest.trim())?.0)),
            "text" => Ok(Command::Text(cell(rest.trim())?.0)),
            "refs" => Ok(Command::Refs(cell(rest.trim())?.0)),
            "size" => bare(Command::Size),
            "values" => bare(Command::Values),
            "texts" => bare(Command::Texts),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Apply the command to `sheet`, writing any output to `out`.
    pub fn execute<W: Write>(&self, sheet: &mut Sheet, out: &mut W) -> Result<()> {
        match self {
            Command::Set { pos, text } => sheet.set_cell(*pos, text)?,
            Command::Clear(pos) => sheet.clear_cell(*pos)?,
            Command::Get(pos) => {
                let value = sheet.value(*pos)?;
                writeln!(out, "{}", value.map(|v| v.to_string()).unwrap_or_default())?;
            }
            Command::Text(pos) => {
                writeln!(out, "{}", sheet.text(*pos)?.unwrap_or_default())?;
            }
            Command::Refs(pos) => {
                let refs = sheet
                    .get_cell(*pos)?
                    .map(|cell| cell.referenced_cells())
                    .unwrap_or_default();
                let names: Vec<String> = refs.iter().map(|p| p.to_string()).collect();
                writeln!(out, "{}", names.join(" "))?;
            }
            Command::Size => {
                let size = sheet.printable_size();
                writeln!(out, "{} {}", size.rows, size.cols)?;
            }
            Command::Values => sheet.print_values(out)?,
            Command::Texts => sheet.print_texts(out)?,
        }
        Ok(())
    }
}

/// Run every command line in `script` against `sheet`.
///
/// Failures are reported on stderr. Returns the number of failed commands;
/// unless `keep_going` is set, execution stops at the first failure.
pub fn run_script<W: Write>(
    sheet: &mut Sheet,
    script: &str,
    out: &mut W,
    keep_going: bool,
) -> Result<usize> {
    let mut failures = 0;
    for (index, line) in script.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        debug!("line {}: {}", index + 1, line);

        let outcome = line
            .parse::<Command>()
            .and_then(|cmd| cmd.execute(sheet, out));
        match outcome {
            Ok(()) => {}
            Err(CommandError::Io(e)) => return Err(CommandError::Io(e)),
            Err(e) => {
                warn!("line {} failed: {}", index + 1, e);
                eprintln!("Error (line {}): {}", index + 1, e);
                failures += 1;
                if !keep_going {
                    break;
                }
            }
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgraph_core::SheetError;

    fn run(script: &str, keep_going: bool) -> (String, usize) {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();
        let failures = run_script(&mut sheet, script, &mut out, keep_going).unwrap();
        (String::from_utf8(out).unwrap(), failures)
    }

    #[test]
    fn test_parse_set_keeps_text_verbatim() {
        let cmd: Command = "set A1 hello  world".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                pos: Position::new(0, 0),
                text: "hello  world".to_string()
            }
        );
        let cmd: Command = "set B2".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                pos: Position::new(1, 1),
                text: String::new()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("frobnicate".parse::<Command>(), Err(CommandError::Unknown(_))));
        assert!(matches!("get".parse::<Command>(), Err(CommandError::MissingCell { .. })));
        assert!(matches!("get A0".parse::<Command>(), Err(CommandError::BadCell(_))));
        assert!(matches!(
            "size 3".parse::<Command>(),
            Err(CommandError::UnexpectedArgument { .. })
        ));
    }

    #[test]
    fn test_script_recalculates() {
        let (out, failures) = run("set A1 =B1+1\nset B1 5\nget A1\nset B1 10\nget A1\n", false);
        assert_eq!(out, "6\n11\n");
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_script_prints_tables() {
        let script = "set A1 hello\nset B1 =1+2\nset B2 '5\ntexts\nvalues\nsize\n";
        let (out, _) = run(script, false);
        assert_eq!(out, "hello\t=1+2\n\t'5\nhello\t3\n\t5\n2 2\n");
    }

    #[test]
    fn test_script_stops_at_first_failure() {
        let (out, failures) = run("set A1 =A1\nget A1\n", false);
        assert_eq!(out, "");
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_script_keep_going() {
        let (out, failures) = run("set A1 =A1\n# comment\n\nset A1 1\nbogus\nget A1\n", true);
        assert_eq!(out, "1\n");
        assert_eq!(failures, 2);
    }

    #[test]
    fn test_execute_surfaces_sheet_errors() {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();
        let cmd = Command::Set {
            pos: Position::new(-1, 0),
            text: "x".to_string(),
        };
        let err = cmd.execute(&mut sheet, &mut out).unwrap_err();
        assert!(matches!(err, CommandError::Sheet(SheetError::InvalidPosition(_))));
    }

    #[test]
    fn test_refs_command() {
        let (out, _) = run("set C1 =B2+A1+B2\nrefs C1\nrefs A1\n", false);
        assert_eq!(out, "A1 B2\n\n");
    }
}
