//! Crate-level error type

use crate::discovery::DiscoveryError;

/// Errors raised while building the core from its static configuration.
///
/// Runtime transport and persistence failures never surface through this type;
/// they are logged and retried by the guards.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The entity table holds more entries than the registry capacity.
    RegistryFull,
    /// An entity descriptor has an empty name.
    EmptyName,
    /// Two descriptors share the same name.
    DuplicateName,
    /// Two descriptors claim the same inbound topic.
    DuplicateTopic,
    /// Two CONTROL entities derive the same persistence key.
    KeyCollision,
    /// A descriptor field or value does not fit its fixed-size buffer.
    Capacity,
    /// A required parameter is absent from the parameter store.
    MissingParameter,
    /// The discovery payload failed structural validation.
    Discovery(DiscoveryError),
}

impl From<DiscoveryError> for Error {
    fn from(err: DiscoveryError) -> Self {
        Error::Discovery(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::RegistryFull => defmt::write!(f, "RegistryFull"),
            Error::EmptyName => defmt::write!(f, "EmptyName"),
            Error::DuplicateName => defmt::write!(f, "DuplicateName"),
            Error::DuplicateTopic => defmt::write!(f, "DuplicateTopic"),
            Error::KeyCollision => defmt::write!(f, "KeyCollision"),
            Error::Capacity => defmt::write!(f, "Capacity"),
            Error::MissingParameter => defmt::write!(f, "MissingParameter"),
            Error::Discovery(e) => defmt::write!(f, "Discovery({})", e),
        }
    }
}
