//! Profile output port trait.

use crate::domain::error::ScreenerError;
use crate::domain::profile::StockProfile;
use std::io::Write;

pub trait ReportPort {
    fn write(&self, profiles: &[StockProfile], out: &mut dyn Write) -> Result<(), ScreenerError>;

    /// Writes to `output_path`, creating or truncating it.
    fn write_file(&self, profiles: &[StockProfile], output_path: &str) -> Result<(), ScreenerError> {
        let mut file = std::fs::File::create(output_path)?;
        self.write(profiles, &mut file)
    }
}
