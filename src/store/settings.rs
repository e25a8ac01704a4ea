//! Store settings pushed down by the provider

/// Settings a provider may apply to its store before any query runs
///
/// Configure how the store materializes snapshot values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Return timestamp fields as timestamps instead of dates
    ///
    /// Default: false
    pub timestamps_in_snapshots: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timestamps_in_snapshots: false,
        }
    }
}

impl StoreSettings {
    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with `timestamps_in_snapshots` set to `enabled`
    pub fn with_timestamps_in_snapshots(enabled: bool) -> Self {
        Self {
            timestamps_in_snapshots: enabled,
        }
    }
}
