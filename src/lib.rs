pub mod bitfield;
pub mod boot_params;
pub mod bootctrl;
pub mod config_helper;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod gpt_helper;
pub mod locator;
pub mod partition_info;
pub mod service;

use log::info;

use crate::boot_params::{BootParamSource, KernelCmdline};
use crate::config_helper::{Backend, Config};
use crate::error::Result;
use crate::gateway::{AttributeGateway, SgdiskGateway};
use crate::gpt_helper::GptGateway;
use crate::locator::{LabelSnapshot, PartitionLocator};
use crate::service::{BootControl, MarkOutcome};

/// show boot state of the booted slot
pub fn show_current_slot<G, P>(ctl: &BootControl<G, P>) -> Result<()>
where
    G: AttributeGateway,
    P: BootParamSource,
{
    println!("{}", ctl.current_state()?);
    Ok(())
}

/// mark the booted slot successful, then show the state again
pub fn mark_current_slot_successful<G, P>(ctl: &BootControl<G, P>) -> Result<()>
where
    G: AttributeGateway,
    P: BootParamSource,
{
    match ctl.mark_successful()? {
        MarkOutcome::AlreadySuccessful(_) => println!("Slot already marked successful"),
        MarkOutcome::Marked(state) => {
            info!("Slot marked successful, successful={}", state.successful)
        }
    }
    show_current_slot(ctl)
}

fn run_with<G, P>(ctl: BootControl<G, P>, mark_successful: bool) -> Result<()>
where
    G: AttributeGateway,
    P: BootParamSource,
{
    show_current_slot(&ctl)?;
    if mark_successful {
        println!();
        mark_current_slot_successful(&ctl)?;
    }
    Ok(())
}

/// Capture the label snapshot once, wire the configured backend and run
pub fn run(config: &Config, mark_successful: bool) -> Result<()> {
    let locator = PartitionLocator::new(LabelSnapshot::discover(&config.label_dirs)?);
    let params = KernelCmdline::new(&config.boot_params);
    match config.backend {
        Backend::Sgdisk => {
            let gateway = SgdiskGateway::new(&config.sgdisk);
            run_with(BootControl::new(gateway, locator, params), mark_successful)
        }
        Backend::Native => {
            let gateway = GptGateway::default();
            run_with(BootControl::new(gateway, locator, params), mark_successful)
        }
    }
}
