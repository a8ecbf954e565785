pub mod orientation;
pub mod planner;
pub mod sync;
pub mod timing;

// Re-export for easier access
pub use orientation::{orient, orient_view, oriented_shape};
pub use planner::{
    ExtractionPlan, LARGE_EXTRACTION_BYTES, plan_extraction, plan_time_window, selection_run,
    window_indices,
};
pub use sync::{SyncPlan, SyncWindow, nearest_frame, sync_window, synchronize};
pub use timing::{UT1_EPOCH, estimate_ut1, fire_pulse_timing, frame_times, parse_time_bound, to_ut1};
