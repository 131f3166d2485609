use std::path::PathBuf;

use ansi_term::{Colour, Style};
use anyhow::Result;
use serde::Serialize;

use crate::{
    storage::counter::CounterStore,
    utils::time::{format_hms, split_hms},
};

/// Report printed by `codetime status`. Derived from the persisted counter,
/// the same record the running daemon flushes into.
#[derive(Debug, Serialize)]
struct StatusReport {
    total_seconds: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl StatusReport {
    fn new(total_seconds: u64) -> Self {
        let (hours, minutes, seconds) = split_hms(total_seconds);
        Self {
            total_seconds,
            hours,
            minutes,
            seconds,
        }
    }
}

pub fn process_status_command(app_dir: PathBuf, json: bool) -> Result<()> {
    let store = CounterStore::new(app_dir)?;
    let total_seconds = store.load();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&StatusReport::new(total_seconds))?
        );
    } else {
        println!(
            "{} {}",
            Style::new().bold().paint("Accumulated code time:"),
            Colour::Green.paint(format_hms(total_seconds)),
        );
    }
    Ok(())
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn report_carries_the_split_components() {
        let report = StatusReport::new(3725);
        let value = serde_json::to_value(report).unwrap();

        assert_eq!(value["total_seconds"], 3725);
        assert_eq!(value["hours"], 1);
        assert_eq!(value["minutes"], 2);
        assert_eq!(value["seconds"], 5);
    }
}
