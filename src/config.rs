use std::path::PathBuf;

use crate::constants::{DEFAULT_PAGEFILE, DEFAULT_TICK_INTERVAL};

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Location of the paging file
    pub pagefile: PathBuf,
    /// Memory accesses between aging ticks; 0 disables the automatic clock
    pub tick_interval: u32,
}

impl SimConfig {
    pub fn with_pagefile(mut self, pagefile: impl Into<PathBuf>) -> Self {
        self.pagefile = pagefile.into();
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: u32) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            pagefile: PathBuf::from(DEFAULT_PAGEFILE),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
