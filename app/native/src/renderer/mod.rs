//! Rendering the current website: surface boundary, load state, navigation
//! errors and the scripts injected after each load.

pub mod customization;
pub mod errors;
pub mod preflight;
pub mod state;
pub mod surface;

pub use customization::InjectionContext;
pub use errors::NavigationError;
pub use state::{Interaction, LOAD_TIMEOUT, LoadPhase, RenderState};
pub use surface::{LoadRequest, Placement, RecordingSurface, RenderSurface, SurfaceCall};
