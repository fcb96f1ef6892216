use std::io;

use amulet_core::OverlapRegion;

///
/// Destination for the overlap regions found when a cell's pending batch is
/// flushed. The report writer implements this; tests collect into a `Vec`.
///
pub trait OverlapSink {
    fn emit(&mut self, cell_id: &str, regions: &[OverlapRegion]) -> io::Result<()>;
}

impl OverlapSink for Vec<(String, OverlapRegion)> {
    fn emit(&mut self, cell_id: &str, regions: &[OverlapRegion]) -> io::Result<()> {
        self.extend(
            regions
                .iter()
                .map(|region| (cell_id.to_string(), region.clone())),
        );
        Ok(())
    }
}
