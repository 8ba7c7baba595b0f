mod design;
mod results;

pub use design::{DesignParameters, GroupSpec, NUM_GROUPS};
pub(crate) use results::grid_len;
pub use results::{CurvePoint, PowerCurve, PowerEstimate, PowerSurface};
