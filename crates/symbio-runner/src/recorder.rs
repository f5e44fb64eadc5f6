//! Periodic data output as JSON lines.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use symbio_core::{PopulationStats, Result, RunId, SymConfig};
use tracing::{debug, info};

/// First line of every data file
#[derive(Debug, Serialize)]
struct Header<'a> {
    run_id: RunId,
    seed: u64,
    started_at: DateTime<Utc>,
    config: &'a SymConfig,
}

/// Writes a header line followed by one line per population sample
pub struct DataRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    samples: u64,
}

impl DataRecorder {
    /// Output file for a run, or `None` when data output is switched off
    pub fn output_path(config: &SymConfig, seed: u64) -> Option<PathBuf> {
        if config.file_name.is_empty() {
            return None;
        }
        Some(PathBuf::from(format!(
            "{}{}{}.jsonl",
            config.file_path, config.file_name, seed
        )))
    }

    pub fn create(
        path: impl AsRef<Path>,
        run_id: RunId,
        seed: u64,
        config: &SymConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        let header = Header {
            run_id,
            seed,
            started_at: Utc::now(),
            config,
        };
        serde_json::to_writer(&mut writer, &header)?;
        writer.write_all(b"\n")?;

        info!(path = %path.display(), "Data file opened");
        Ok(Self {
            path,
            writer,
            samples: 0,
        })
    }

    pub fn record(&mut self, stats: &PopulationStats) -> Result<()> {
        serde_json::to_writer(&mut self.writer, stats)?;
        self.writer.write_all(b"\n")?;
        self.samples += 1;
        debug!(update = stats.update, "Sample written");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered lines, returning how many samples were written
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        info!(path = %self.path.display(), samples = self.samples, "Data file closed");
        Ok(self.samples)
    }
}
