//! Line-oriented interactive session over an `ExpireMap<u64, u64>`.

use std::io::{self, BufRead, Write};

use expire_map_core::ExpireMap;
use thiserror::Error;

pub const HELP: &str = "commands: p|put <key> <value> <ttl_ms>, g|get <key>, r|remove <key>, \
s|size, h|help, q|quit";

/// One parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Put { key: u64, value: u64, ttl_ms: u64 },
    Get { key: u64 },
    Remove { key: u64 },
    Size,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("'{0}' is not an unsigned 64-bit integer")]
    NotANumber(String),
}

fn parse_u64(raw: &str) -> Result<u64, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::NotANumber(raw.to_string()))
}

fn expect_args<'a>(
    command: &'static str,
    args: &'a [&'a str],
    expected: usize,
) -> Result<&'a [&'a str], ParseError> {
    if args.len() == expected {
        Ok(args)
    } else {
        Err(ParseError::Arity {
            command,
            expected,
            got: args.len(),
        })
    }
}

impl Command {
    /// Parses a command line. Command names are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "p" | "put" => {
                let args = expect_args("put", &args, 3)?;
                Ok(Command::Put {
                    key: parse_u64(args[0])?,
                    value: parse_u64(args[1])?,
                    ttl_ms: parse_u64(args[2])?,
                })
            }
            "g" | "get" => {
                let args = expect_args("get", &args, 1)?;
                Ok(Command::Get {
                    key: parse_u64(args[0])?,
                })
            }
            "r" | "remove" => {
                let args = expect_args("remove", &args, 1)?;
                Ok(Command::Remove {
                    key: parse_u64(args[0])?,
                })
            }
            "s" | "size" => expect_args("size", &args, 0).map(|_| Command::Size),
            "h" | "help" => Ok(Command::Help),
            "q" | "quit" => Ok(Command::Quit),
            _ => Err(ParseError::Unknown(name)),
        }
    }
}

/// Applies one command and writes its result. Returns `false` on `quit`.
fn execute<W: Write>(map: &ExpireMap<u64, u64>, command: Command, output: &mut W) -> io::Result<bool> {
    match command {
        Command::Put { key, value, ttl_ms } => {
            map.put(key, value, ttl_ms);
            tracing::debug!(key, ttl_ms, "put");
        }
        Command::Get { key } => match map.get(&key) {
            Some(value) => writeln!(output, "Value for key {key} is {value}")?,
            None => writeln!(output, "Value for key {key} does not exist.")?,
        },
        Command::Remove { key } => {
            map.remove(&key);
            tracing::debug!(key, "remove");
        }
        Command::Size => writeln!(output, "size: {}", map.size())?,
        Command::Help => writeln!(output, "{HELP}")?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Reads commands from `input` until `quit` or end of input.
///
/// Bad lines are reported on `output` and the session continues.
pub fn run_session<R: BufRead, W: Write>(
    map: &ExpireMap<u64, u64>,
    input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(output, "{HELP}")?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(command) => {
                if !execute(map, command, &mut output)? {
                    writeln!(output, "exiting interactive mode.")?;
                    break;
                }
            }
            Err(err) => writeln!(output, "invalid command: {err}")?,
        }
        output.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(script: &str) -> String {
        let map = ExpireMap::new();
        let mut output = Vec::new();
        run_session(&map, Cursor::new(script), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_put_variants() {
        let expected = Command::Put {
            key: 1,
            value: 1234,
            ttl_ms: 1000,
        };
        assert_eq!(Command::parse("p 1 1234 1000"), Ok(expected));
        assert_eq!(Command::parse("PUT 1 1234 1000"), Ok(expected));
        assert_eq!(Command::parse("  put   1 1234\t1000 "), Ok(expected));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("g 7"), Ok(Command::Get { key: 7 }));
        assert_eq!(Command::parse("R 7"), Ok(Command::Remove { key: 7 }));
        assert_eq!(Command::parse("size"), Ok(Command::Size));
        assert_eq!(Command::parse("h"), Ok(Command::Help));
        assert_eq!(Command::parse("Q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse(""), Err(ParseError::Empty));
        assert_eq!(
            Command::parse("x 1"),
            Err(ParseError::Unknown("x".to_string()))
        );
        assert_eq!(
            Command::parse("p 1 2"),
            Err(ParseError::Arity {
                command: "put",
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            Command::parse("g -1"),
            Err(ParseError::NotANumber("-1".to_string()))
        );
    }

    #[test]
    fn test_session_put_get_remove() {
        let out = session("p 1 1234 60000\ng 1\ns\nr 1\ng 1\nq\ng 1\n");

        assert!(out.contains("Value for key 1 is 1234"));
        assert!(out.contains("size: 1"));
        assert!(out.contains("Value for key 1 does not exist."));
        assert!(out.contains("exiting interactive mode."));
        // nothing after quit is executed
        assert_eq!(out.matches("does not exist").count(), 1);
    }

    #[test]
    fn test_session_reports_bad_lines_and_continues() {
        let out = session("bogus\np 1\n\ng 2\n");

        assert!(out.contains("invalid command: unknown command 'bogus'"));
        assert!(out.contains("invalid command: 'put' expects 3 argument(s), got 1"));
        assert!(out.contains("Value for key 2 does not exist."));
    }

    #[test]
    fn test_session_ends_at_eof() {
        let out = session("p 5 6 60000\n");
        assert!(out.starts_with(HELP));
    }
}
