//! Shared types and the pure Game of Life transition rule for the
//! distributed broker/worker/client system.

mod cell;
mod error;
mod life;
#[cfg(feature = "server")]
mod logging;
mod params;
#[cfg(feature = "server")]
mod shutdown;
mod world;

pub use cell::Cell;
pub use error::GolError;
pub use life::{assemble, compute_stripe, step_full, stripe_bounds};
#[cfg(feature = "server")]
pub use logging::init_logging;
pub use params::Params;
#[cfg(feature = "server")]
pub use shutdown::install_interrupt_handler;
pub use world::World;
