use log::{debug, info};

use crate::boot_params::{ActiveSlotResolver, BootParamSource};
use crate::bootctrl::{SlotState, ATTR_BOOT_SUCCESSFUL_BIT};
use crate::error::Result;
use crate::gateway::AttributeGateway;
use crate::locator::{PartitionLocation, PartitionLocator};

/// Result of a mark-successful request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// nothing was written
    AlreadySuccessful(SlotState),
    /// state re-read after setting the bit
    Marked(SlotState),
}

/// Boot control for the slot the system is running from.
/// The other slot is never read or written.
pub struct BootControl<G: AttributeGateway, P: BootParamSource> {
    gateway: G,
    locator: PartitionLocator,
    resolver: ActiveSlotResolver<P>,
}

impl<G: AttributeGateway, P: BootParamSource> BootControl<G, P> {
    pub fn new(gateway: G, locator: PartitionLocator, params: P) -> Self {
        BootControl {
            gateway,
            locator,
            resolver: ActiveSlotResolver::new(params),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn booted_slot_suffix(&self) -> Result<String> {
        self.resolver.booted_slot_suffix()
    }

    pub fn active_partition(&self) -> Result<PartitionLocation> {
        let label = self.resolver.active_label()?;
        self.locator.resolve(&label)
    }

    pub fn current_state(&self) -> Result<SlotState> {
        let location = self.active_partition()?;
        self.read_state(&location)
    }

    pub fn mark_successful(&self) -> Result<MarkOutcome> {
        let location = self.active_partition()?;
        let state = self.read_state(&location)?;
        if state.successful {
            return Ok(MarkOutcome::AlreadySuccessful(state));
        }
        info!("Marking {} partition {} successful", location.disk.display(), location.index);
        self.gateway.set_attribute_bit(&location, ATTR_BOOT_SUCCESSFUL_BIT)?;
        Ok(MarkOutcome::Marked(self.read_state(&location)?))
    }

    fn read_state(&self, location: &PartitionLocation) -> Result<SlotState> {
        let info = self.gateway.read(location)?;
        debug!("Read partition\n{}", info);
        Ok(SlotState::from_attributes(&info.attributes))
    }
}
