//! Load, save and execute commands

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use wdcload_core::format::{LoadFormat, SaveFormat};
use wdcload_core::{Session, TransferProgress, TransferSummary, Transport};

/// Create a progress bar for a transfer of known size
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Create a spinner for a transfer of unknown size
fn create_spinner(phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] {} {{msg}}", phase))?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Terminal progress display for transfers
pub struct IndicatifProgress {
    phase: &'static str,
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new(phase: &'static str) -> Self {
        Self { phase, bar: None }
    }
}

impl TransferProgress for IndicatifProgress {
    fn start(&mut self, total_bytes: Option<usize>) {
        let pb = match total_bytes {
            Some(total) => create_progress_bar(total as u64, self.phase)
                .unwrap_or_else(|_| ProgressBar::new(total as u64)),
            None => create_spinner(self.phase).unwrap_or_else(|_| ProgressBar::new_spinner()),
        };
        self.bar = Some(pb);
    }

    fn record(&mut self, address: u32, bytes: usize) {
        if let Some(pb) = &self.bar {
            if pb.length().is_some() {
                pb.set_position(bytes as u64);
            } else {
                pb.set_message(format!("{} bytes, last record at 0x{:06X}", bytes, address));
            }
        }
    }

    fn complete(&mut self, summary: &TransferSummary) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!(
                "{} bytes in {} records",
                summary.bytes, summary.records
            ));
        }
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // An aborted transfer leaves the bar behind otherwise
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
    }
}

/// Load `file` and optionally start it
pub fn run_load<T: Transport>(
    session: &mut Session<T>,
    file: &Path,
    format: LoadFormat,
    exec: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new("Loading");
    let summary = session.load_file(format, file, &mut progress)?;
    println!("Loaded {} bytes from {}.", summary.bytes, file.display());

    if let Some(address) = exec {
        run_exec(session, address)?;
    }
    Ok(())
}

/// Save `length` bytes at `address` into `file`
pub fn run_save<T: Transport>(
    session: &mut Session<T>,
    address: u32,
    length: usize,
    file: &Path,
    format: SaveFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new("Saving");
    let summary = session.save_file(format, address, length, file, &mut progress)?;
    println!(
        "Saved {} bytes from 0x{:06X} to {} ({}).",
        summary.bytes,
        address,
        file.display(),
        format
    );
    Ok(())
}

/// Start execution at `address`
pub fn run_exec<T: Transport>(
    session: &mut Session<T>,
    address: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    session.execute(address)?;
    println!("Executing at 0x{:06X} on {}.", address, session.board_type());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdcload_dummy::{DummyBoard, Execution};

    #[test]
    fn test_load_then_exec() {
        let path = std::env::temp_dir().join(format!("wdcload-cli-{}.bin", std::process::id()));
        std::fs::write(&path, [0x5A, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x60]).unwrap();

        let mut dummy = DummyBoard::new_default();
        let mut session = Session::open(&mut dummy).unwrap();
        run_load(&mut session, &path, LoadFormat::Wdc, Some(0x0200)).unwrap();
        drop(session);

        assert_eq!(dummy.memory()[0x0200], 0x60);
        assert_eq!(dummy.executions(), &[Execution::Debug { pc: 0x0200 }]);
        std::fs::remove_file(path).unwrap();
    }
}
