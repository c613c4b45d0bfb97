/// Track state enumeration for object tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet confirmed and not reported
    #[default]
    Tentative,
    /// Track has been matched often enough to be reported
    Confirmed,
    /// Retired; terminal
    Deleted,
}
