use crate::ecs::{ComponentError, SystemHandle};
use thiserror::Error;

/// Errors that can occur while registering or reconfiguring a system.
#[derive(Debug, Error)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered as system {existing}")]
    AlreadyRegistered {
        name: String,
        existing: SystemHandle,
    },

    #[error("no system registered under handle {0}")]
    UnknownSystem(SystemHandle),

    #[error("system '{name}' requires an unregistrable component: {source}")]
    Component {
        name: String,
        #[source]
        source: ComponentError,
    },
}
