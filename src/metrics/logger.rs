use super::QueueSample;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

/// Writes queue samples as `time,qlen,min_th,max_th` rows.
pub struct SampleLogger {
    writer: Writer<File>,
}

impl SampleLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, sample: &QueueSample) -> Result<()> {
        self.writer.serialize(sample)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_batch(&mut self, samples: &[QueueSample]) -> Result<()> {
        for sample in samples {
            self.writer.serialize(sample)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
