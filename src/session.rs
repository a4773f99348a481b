//! A simulated process: one page table driven through one MMU context

use std::io::{BufRead, Write};

use log::{debug, warn};

use crate::command::{format_bytes, Command};
use crate::config::SimConfig;
use crate::error::Result;
use crate::mmu::{MmuContext, MmuStats};
use crate::page_table::PageTable;

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Bytes(Vec<u8>),
    Done,
    Halted(MmuStats),
}

pub struct Session {
    mmu: MmuContext,
    table: PageTable,
}

impl Session {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Ok(Session {
            mmu: MmuContext::init(config)?,
            table: PageTable::new(),
        })
    }

    pub fn mmu(&self) -> &MmuContext {
        &self.mmu
    }

    pub fn page_table(&self) -> &PageTable {
        &self.table
    }

    pub fn execute(&mut self, command: &Command) -> Result<Outcome> {
        debug!("> {}", command);
        let (mmu, table) = (&mut self.mmu, &mut self.table);
        let outcome = match *command {
            Command::Read { va } => Outcome::Bytes(vec![mmu.read(table, va)?]),
            Command::ReadN { va, n } => Outcome::Bytes(mmu.read_n(table, va, n)?),
            Command::Write { va, value } => {
                mmu.write(table, va, value)?;
                Outcome::Done
            }
            Command::WriteW { va, bytes } => {
                mmu.write_word(table, va, bytes)?;
                Outcome::Done
            }
            Command::WriteDw { va, bytes } => {
                mmu.write_dword(table, va, bytes)?;
                Outcome::Done
            }
            Command::WriteZ { va, n } => {
                mmu.write_zeros(table, va, n)?;
                Outcome::Done
            }
            Command::Halt => Outcome::Halted(mmu.halt(table)?),
        };
        Ok(outcome)
    }

    /// Execute commands line by line until HALT or end of input.
    ///
    /// Bad commands and lines that are not UTF-8 are logged and skipped;
    /// backing store failures and MMU invariant violations end the run.
    /// A failing input stream still flushes every dirty page before the
    /// read error is returned.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<MmuStats> {
        let mut buf = Vec::new();
        let mut lineno = 0usize;
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => lineno += 1,
                Err(e) => {
                    warn!("line {}: input failed: {}", lineno + 1, e);
                    self.mmu.halt(&mut self.table)?;
                    return Err(e.into());
                }
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("line {}: not valid UTF-8: {}", lineno, e);
                    continue;
                }
            };
            let command = match Command::parse(line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    warn!("line {}: {}", lineno, e);
                    continue;
                }
            };

            match self.execute(&command) {
                Ok(Outcome::Bytes(bytes)) => {
                    writeln!(out, "{}", format_bytes(&bytes))?;
                }
                Ok(Outcome::Done) => {}
                Ok(Outcome::Halted(stats)) => return Ok(stats),
                Err(e) if e.is_contract_violation() => {
                    warn!("line {}: {}: {}", lineno, command, e);
                }
                Err(e) => return Err(e),
            }
        }

        debug!("end of input, halting");
        self.mmu.halt(&mut self.table)
    }

    /// Power off the MMU
    pub fn shutdown(self) -> Result<()> {
        self.mmu.destroy()
    }
}
