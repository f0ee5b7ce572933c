use clap::ValueEnum;

use crate::submodules::input_params::ScanConfig;

pub mod coil_aspect_scan;
pub mod design_space_r_b;

/// Built-in studies selectable with `--preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    CoilAspect,
    DesignSpaceRb,
}

impl Preset {
    pub fn config(self) -> ScanConfig {
        match self {
            Preset::CoilAspect => coil_aspect_scan::config(),
            Preset::DesignSpaceRb => design_space_r_b::config(),
        }
    }
}
