//! Report generation port trait.

use crate::domain::error::ScreenError;
use crate::domain::screen::ScreenReport;
use std::path::Path;

/// Port for publishing a finished screening run.
pub trait ReportPort {
    fn write_screen(&self, report: &ScreenReport, output_dir: &Path) -> Result<(), ScreenError>;
}
