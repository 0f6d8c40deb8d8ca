//! Sarab engine.
//!
//! Drives one tunnel session end to end: pick an identity, make sure the
//! `cloudflared` executable is runnable, provision the remote tunnel and its
//! DNS record, write the local ingress config, supervise the process, and
//! remove the DNS record on every exit path. Also implements the fleet-wide
//! scan (`list`) and bulk teardown (`nuke`).

pub mod artifact;
pub mod control;
pub mod error;
pub mod ingress;
pub mod logfilter;
pub mod naming;
pub mod orchestrator;
pub mod rotator;
pub mod session;
pub mod ssh;
pub mod supervisor;

pub use error::EngineError;
pub use orchestrator::{Illusionist, NukeReport};
pub use rotator::IdentityRotator;
pub use session::{ExposeRequest, Scheme};
pub use supervisor::CloudflaredSupervisor;
