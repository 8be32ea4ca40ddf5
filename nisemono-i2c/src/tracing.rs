//! Provide tracing, tailored to this crate.
//!
//! A host program should call [`init_stdout`] once at startup to install a
//! tracing subscriber. The rest of the crate includes
//! `use crate::tracing::prelude::*` for convenient access to the `trace!()`,
//! `debug!()`, `info!()`, `warn!()`, and `error!()` macros.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Log to stdout, filtering according to environment variable RUST_LOG,
/// overriding the default level (ERROR) to INFO.
pub fn init_stdout() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
