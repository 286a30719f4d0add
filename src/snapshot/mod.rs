//! System snapshot.
//!
//! - [`records`] - Canonical record types, one per platform facet
//! - [`aggregator`] - Parallel collection of every probe into a [`SystemSnapshot`]

pub mod aggregator;
pub mod records;

pub use aggregator::{SnapshotAggregator, JOBS};
pub use records::{
    BootModeRecord, DiskStyleRecord, FirmwareMode, HardwareRecord, PartitionStyle,
    ProbeDiagnostic, SecureBootKeyRecord, SecureBootRecord, SecureBootSource,
    SecurityAgentRecord, ServiceStatusRecord, StartPolicy, SystemSnapshot, TpmRecord,
    VirtualizationRecord,
};
