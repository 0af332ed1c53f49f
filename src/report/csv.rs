// Sample records as CSV: timestamp,worker_id,value,changed

use std::io::Write;
use std::path::Path;

use crate::models::SampleRecord;

pub const HEADER: &str = "timestamp,worker_id,value,changed";

pub fn write_samples<W: Write>(w: W, records: &[SampleRecord]) -> anyhow::Result<()> {
    let mut writer = ::csv::Writer::from_writer(w);
    writer.write_record(HEADER.split(','))?;
    for r in records {
        writer.write_record([
            r.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
            r.worker_id.to_string(),
            r.value.clone(),
            r.changed.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_samples_file(path: &str, records: &[SampleRecord]) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_samples(std::io::BufWriter::new(file), records)
}
