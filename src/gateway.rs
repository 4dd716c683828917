use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::locator::PartitionLocation;
use crate::partition_info::PartitionInfo;

/// Access to the attribute flags of one GPT entry
pub trait AttributeGateway {
    fn read(&self, location: &PartitionLocation) -> Result<PartitionInfo>;
    /// Set a single bit of the attribute field, there is no clear counterpart
    fn set_attribute_bit(&self, location: &PartitionLocation, bit_index: u32) -> Result<()>;
}

/// Gateway backed by the `sgdisk` command line tool
pub struct SgdiskGateway {
    program: PathBuf,
}

impl SgdiskGateway {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        SgdiskGateway { program: program.into() }
    }

    /// `sgdisk --pretend --info=<index> <disk>`
    pub fn info_command(&self, location: &PartitionLocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--pretend")
            .arg(format!("--info={}", location.index))
            .arg(&location.disk);
        cmd
    }

    /// `sgdisk --attributes=<index>:<stanza> <disk>`
    /// ## Errors
    /// Stanzas containing whitespace are refused before anything runs
    pub fn attributes_command(&self, location: &PartitionLocation, stanza: &str) -> Result<Command> {
        if stanza.chars().any(char::is_whitespace) {
            return Err(Error::Parse(format!("refusing attribute stanza with whitespace '{}'", stanza)));
        }
        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("--attributes={}:{}", location.index, stanza))
            .arg(&location.disk);
        Ok(cmd)
    }
}

impl AttributeGateway for SgdiskGateway {
    fn read(&self, location: &PartitionLocation) -> Result<PartitionInfo> {
        let mut cmd = self.info_command(location);
        debug!("Running {:?}", cmd);
        let output = cmd
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| Error::Invocation(format!("spawn {}: {}", self.program.display(), e)))?;
        // a failed query still goes through the parser, which reports the missing fields
        if !output.status.success() {
            warn!("{} exited with {}", self.program.display(), output.status);
        }
        PartitionInfo::parse_report(&String::from_utf8_lossy(&output.stdout))
    }

    fn set_attribute_bit(&self, location: &PartitionLocation, bit_index: u32) -> Result<()> {
        let mut cmd = self.attributes_command(location, &format!("set:{}", bit_index))?;
        debug!("Running {:?}", cmd);
        let status = cmd
            .stdin(Stdio::null())
            .status()
            .map_err(|e| Error::Invocation(format!("spawn {}: {}", self.program.display(), e)))?;
        if !status.success() {
            return Err(Error::Invocation(format!(
                "{} failed to set bit {} on {} partition {}: {}",
                self.program.display(), bit_index, location.disk.display(), location.index, status
            )));
        }
        Ok(())
    }
}
