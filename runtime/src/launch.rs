//! Launch grid computation for device backends.

use snafu::{OptionExt, ensure};

use crate::error::{EmptyLaunchSnafu, LaunchOverflowSnafu, Result};

/// One-dimensional block/grid shape covering an element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchGrid {
    pub grid: u32,
    pub block: u32,
}

impl LaunchGrid {
    /// Smallest grid of `block`-sized blocks covering `count` elements.
    pub fn for_elements(count: usize, block: u32) -> Result<Self> {
        ensure!(count > 0, EmptyLaunchSnafu { what: "zero elements" });
        ensure!(block > 0, EmptyLaunchSnafu { what: "zero threads per block" });

        let grid = u32::try_from(count.div_ceil(block as usize)).ok().context(LaunchOverflowSnafu { count, block })?;
        Ok(Self { grid, block })
    }

    /// Total threads launched.
    pub fn threads(&self) -> u64 {
        u64::from(self.grid) * u64::from(self.block)
    }
}

#[cfg(feature = "cuda")]
impl From<LaunchGrid> for cudarc::driver::LaunchConfig {
    fn from(grid: LaunchGrid) -> Self {
        Self { grid_dim: (grid.grid, 1, 1), block_dim: (grid.block, 1, 1), shared_mem_bytes: 0 }
    }
}
