use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, Write},
    path::PathBuf,
};

use anyhow::Result;
use fs4::fs_std::FileExt;
use tracing::{debug, warn};

use super::badge::render_badge;

pub const DATA_FILE: &str = "code_time.dat";
pub const BADGE_FILE: &str = "badge.md";

/// Owns the durable footprint of the tracker: the counter record and the
/// derived badge artifact, both living inside the application directory.
pub struct CounterStore {
    data_path: PathBuf,
    badge_path: PathBuf,
}

impl CounterStore {
    pub fn new(app_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&app_dir)?;

        Ok(Self {
            data_path: app_dir.join(DATA_FILE),
            badge_path: app_dir.join(BADGE_FILE),
        })
    }

    /// Reads the persisted counter. A missing record or unparsable content
    /// yields zero, so a fresh or damaged installation starts counting
    /// instead of failing.
    pub fn load(&self) -> u64 {
        match self.read_counter() {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    "Could not read counter from {:?}, defaulting to 0: {e:?}",
                    self.data_path
                );
                0
            }
        }
    }

    fn read_counter(&self) -> Result<u64> {
        let mut file = match File::open(&self.data_path) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No counter record at {:?}", self.data_path);
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file)?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        FileExt::unlock(&file)?;
        read?;
        Ok(content.trim().parse()?)
    }

    /// Overwrites the counter record wholesale. Last writer wins.
    pub fn save(&self, total_seconds: u64) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.data_path)?;
        FileExt::lock_exclusive(&file)?;
        let written = write_truncated(&mut file, total_seconds.to_string().as_bytes());
        FileExt::unlock(&file)?;
        written?;
        Ok(())
    }

    /// Regenerates the badge artifact for a counter value.
    pub fn update_badge(&self, total_seconds: u64) -> Result<()> {
        std::fs::write(&self.badge_path, render_badge(total_seconds))?;
        Ok(())
    }
}

fn write_truncated(file: &mut File, content: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.rewind()?;
    file.write_all(content)?;
    file.flush()
}
