//! Host name enricher

use super::Enricher;
use crate::core::LogEvent;

pub const MACHINE_NAME_PROPERTY: &str = "MachineName";

/// Adds `MachineName`, resolved once when the enricher is created
#[derive(Debug, Clone)]
pub struct MachineNameEnricher {
    machine_name: String,
}

impl MachineNameEnricher {
    pub fn new() -> Self {
        let machine_name = gethostname::gethostname().to_string_lossy().into_owned();
        Self { machine_name }
    }

    /// Use a fixed name instead of querying the host
    pub fn with_name(machine_name: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
        }
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }
}

impl Default for MachineNameEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl Enricher for MachineNameEnricher {
    fn enrich(&self, event: &mut LogEvent) {
        event.add_property_if_absent(MACHINE_NAME_PROPERTY, self.machine_name.as_str());
    }
}
