use crate::Va;

/// An error that can occur when interpreting guest CPU state.
#[derive(thiserror::Error, Debug)]
pub enum HvxError {
    /// An error occurred in one of the accessors.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),

    /// The null selector was used to reference the global descriptor table.
    #[error("Invalid selector (0x{selector:04x})")]
    InvalidSelector {
        /// The raw selector value.
        selector: u16,
    },

    /// The descriptor table entry lies beyond the table limit.
    #[error("Descriptor table limit exceeded (index: {index}, limit: 0x{limit:x})")]
    LimitExceeded {
        /// The index of the entry.
        index: u32,

        /// The limit of the descriptor table.
        limit: u32,
    },

    /// The guest memory at the given address is not accessible.
    #[error("Memory not accessible ({0})")]
    MemoryFault(Va),

    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

impl HvxError {
    /// Creates a new driver error.
    pub fn driver(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(error.into())
    }
}
