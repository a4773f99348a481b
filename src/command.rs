//! Command language driving the MMU
//!
//! One command per line, e.g. `WRITEW 0b1010_0000_0000_0000_0100 0x1 7`.
//! Numbers may be written as `0b` binary, `0x` hex or plain decimal.

use std::fmt;

use crate::constants::VA_SPACE;
use crate::error::{MmuError, Result};
use crate::translation::VirtualAddress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read { va: VirtualAddress },
    ReadN { va: VirtualAddress, n: usize },
    Write { va: VirtualAddress, value: u8 },
    WriteW { va: VirtualAddress, bytes: [u8; 2] },
    WriteDw { va: VirtualAddress, bytes: [u8; 4] },
    WriteZ { va: VirtualAddress, n: usize },
    Halt,
}

impl Command {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let name = tokens[0].to_ascii_uppercase();
        let args = &tokens[1..];

        let command = match name.as_str() {
            "READ" => {
                expect_args(&name, args, 1)?;
                Command::Read { va: parse_address(args[0])? }
            }
            "READN" => {
                expect_args(&name, args, 2)?;
                Command::ReadN {
                    va: parse_address(args[0])?,
                    n: parse_count(args[1])?,
                }
            }
            "WRITE" => {
                expect_args(&name, args, 2)?;
                Command::Write {
                    va: parse_address(args[0])?,
                    value: parse_byte(args[1])?,
                }
            }
            "WRITEW" => {
                expect_args(&name, args, 3)?;
                Command::WriteW {
                    va: parse_address(args[0])?,
                    bytes: [parse_byte(args[1])?, parse_byte(args[2])?],
                }
            }
            "WRITEDW" => {
                expect_args(&name, args, 5)?;
                Command::WriteDw {
                    va: parse_address(args[0])?,
                    bytes: [
                        parse_byte(args[1])?,
                        parse_byte(args[2])?,
                        parse_byte(args[3])?,
                        parse_byte(args[4])?,
                    ],
                }
            }
            "WRITEZ" => {
                expect_args(&name, args, 2)?;
                Command::WriteZ {
                    va: parse_address(args[0])?,
                    n: parse_count(args[1])?,
                }
            }
            "HALT" => {
                expect_args(&name, args, 0)?;
                Command::Halt
            }
            _ => return Err(MmuError::Parse(format!("Unknown command: {}", tokens[0]))),
        };
        Ok(Some(command))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Read { va } => write!(f, "READ {:#07x}", va.va),
            Command::ReadN { va, n } => write!(f, "READN {:#07x} {}", va.va, n),
            Command::Write { va, value } => write!(f, "WRITE {:#07x} {:#04x}", va.va, value),
            Command::WriteW { va, bytes } => {
                write!(f, "WRITEW {:#07x} {:#04x} {:#04x}", va.va, bytes[0], bytes[1])
            }
            Command::WriteDw { va, bytes } => write!(
                f,
                "WRITEDW {:#07x} {:#04x} {:#04x} {:#04x} {:#04x}",
                va.va, bytes[0], bytes[1], bytes[2], bytes[3]
            ),
            Command::WriteZ { va, n } => write!(f, "WRITEZ {:#07x} {}", va.va, n),
            Command::Halt => write!(f, "HALT"),
        }
    }
}

fn expect_args(name: &str, args: &[&str], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(MmuError::Parse(format!(
            "{} takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

/// Parse a `0b`, `0x` or decimal literal. Underscores are allowed as separators.
pub fn parse_number(token: &str) -> Result<u32> {
    let cleaned = token.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(bin) = lower.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else if let Some(hex) = lower.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else {
        lower.parse::<u32>()
    };
    parsed.map_err(|_| MmuError::Parse(format!("Invalid number: {}", token)))
}

pub fn parse_address(token: &str) -> Result<VirtualAddress> {
    let va = parse_number(token)?;
    if va >= VA_SPACE {
        return Err(MmuError::Parse(format!(
            "Virtual address {} exceeds max {:#x}",
            token,
            VA_SPACE - 1
        )));
    }
    Ok(VirtualAddress::from_raw(va))
}

pub fn parse_byte(token: &str) -> Result<u8> {
    let value = parse_number(token)?;
    u8::try_from(value).map_err(|_| MmuError::Parse(format!("Byte value {} exceeds 0xff", token)))
}

pub fn parse_count(token: &str) -> Result<usize> {
    parse_number(token).map(|n| n as usize)
}

/// Render bytes the way READ/READN print them
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:#04x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(parse_number("0b1010").unwrap(), 10);
        assert_eq!(parse_number("0B1_0000_0000_0000").unwrap(), 4096);
        assert_eq!(parse_number("0x2A").unwrap(), 42);
        assert_eq!(parse_number("123").unwrap(), 123);
        assert!(parse_number("0b102").is_err());
        assert!(parse_number("abc").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_parse_read() {
        let cmd = parse("READ 0b00000101_000000000000");
        assert_eq!(cmd, Command::Read { va: VirtualAddress::from_raw(5 << 12) });
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse("halt"), Command::Halt);
        assert!(matches!(parse("readn 0 4"), Command::ReadN { n: 4, .. }));
    }

    #[test]
    fn test_parse_writes() {
        assert_eq!(
            parse("WRITE 0x5000 0b1111"),
            Command::Write { va: VirtualAddress::from_raw(0x5000), value: 15 }
        );
        assert_eq!(
            parse("WRITEW 10 1 2"),
            Command::WriteW { va: VirtualAddress::from_raw(10), bytes: [1, 2] }
        );
        assert_eq!(
            parse("WRITEDW 0 0xde 0xad 0xbe 0xef"),
            Command::WriteDw { va: VirtualAddress::from_raw(0), bytes: [0xde, 0xad, 0xbe, 0xef] }
        );
        assert_eq!(
            parse("WRITEZ 4096 100"),
            Command::WriteZ { va: VirtualAddress::from_raw(4096), n: 100 }
        );
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   \t").unwrap(), None);
        assert_eq!(Command::parse("# setup").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("JUMP 0").is_err());
        assert!(Command::parse("READ").is_err());
        assert!(Command::parse("READ 1 2").is_err());
        assert!(Command::parse("HALT now").is_err());
        assert!(Command::parse("WRITE 0 256").is_err());
        assert!(Command::parse("WRITEDW 0 1 2 3").is_err());
        // 2^20 is one past the top of the address space
        assert!(Command::parse("READ 0x100000").is_err());
        assert!(Command::parse("READ 0xFFFFF").is_ok());
    }

    #[test]
    fn test_display_round_trips() {
        for line in ["READ 0x00010", "WRITEDW 0x00000 0x01 0x02 0x03 0x04", "WRITEZ 0x01000 3", "HALT"] {
            let cmd = parse(line);
            assert_eq!(parse(&cmd.to_string()), cmd);
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(&[0, 10, 255]), "0x00 0x0a 0xff");
        assert_eq!(format_bytes(&[]), "");
    }
}
