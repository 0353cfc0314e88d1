//! Configuration for the GLL parser

pub use crate::gss::GssIdentity;
pub use crate::sppf::LookupDistribution;

/// Order in which pending descriptors are processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum WorklistOrder {
    /// Oldest first
    #[default]
    Fifo,
    /// Newest first
    Lifo,
}

/// Configuration options for the GLL parser
///
/// None of the options change what is parsed: the resulting forest is the
/// same for every combination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// How GSS nodes are looked up
    pub gss_identity: GssIdentity,

    /// How SPPF nodes are looked up
    pub lookup_distribution: LookupDistribution,

    /// Descriptor processing order
    pub worklist: WorklistOrder,
}

impl ParserConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_gss_identity(mut self, identity: GssIdentity) -> Self {
        self.gss_identity = identity;
        self
    }

    #[must_use]
    pub const fn with_lookup_distribution(mut self, distribution: LookupDistribution) -> Self {
        self.lookup_distribution = distribution;
        self
    }

    #[must_use]
    pub const fn with_worklist(mut self, order: WorklistOrder) -> Self {
        self.worklist = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ParserConfig::new()
            .with_gss_identity(GssIdentity::HashMap)
            .with_lookup_distribution(LookupDistribution::Global)
            .with_worklist(WorklistOrder::Lifo);
        assert_eq!(config.gss_identity, GssIdentity::HashMap);
        assert_eq!(config.lookup_distribution, LookupDistribution::Global);
        assert_eq!(config.worklist, WorklistOrder::Lifo);
        assert_eq!(ParserConfig::default().worklist, WorklistOrder::Fifo);
    }
}
