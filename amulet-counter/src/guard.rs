use std::sync::Arc;

use fxhash::FxHashSet;
use log::warn;

use amulet_core::Position;

use crate::errors::{CounterError, Result};

///
/// Checks that placed records arrive grouped by chromosome and sorted by
/// start within each chromosome.
///
/// With `trust` set, the first violation is logged once and everything is
/// let through.
///
#[derive(Debug, Default)]
pub struct SortOrderGuard {
    trust: bool,
    current: Option<Arc<str>>,
    previous_start: Position,
    finished: FxHashSet<Arc<str>>,
    warned: bool,
}

impl SortOrderGuard {
    pub fn new(trust: bool) -> Self {
        SortOrderGuard {
            trust,
            ..Default::default()
        }
    }

    pub fn observe(&mut self, chr: &Arc<str>, start: Position) -> Result<()> {
        match &self.current {
            Some(current) if current == chr => {
                if start < self.previous_start {
                    let previous = self.previous_start;
                    self.previous_start = start;
                    return self.violation(CounterError::UnsortedInput {
                        chr: chr.to_string(),
                        start,
                        previous,
                    });
                }
            }
            _ => {
                let revisited = self.finished.contains(chr);
                let current = self.current.replace(Arc::clone(chr));
                if let Some(current) = current {
                    self.finished.insert(current.clone());
                    if revisited {
                        self.previous_start = start;
                        return self.violation(CounterError::ChromosomeRevisited {
                            chr: chr.to_string(),
                            current: current.to_string(),
                        });
                    }
                }
            }
        }

        self.previous_start = start;
        Ok(())
    }

    fn violation(&mut self, err: CounterError) -> Result<()> {
        if !self.trust {
            return Err(err);
        }
        if !self.warned {
            warn!("{err}; continuing because the input is trusted to be sorted");
            self.warned = true;
        }
        Ok(())
    }
}
