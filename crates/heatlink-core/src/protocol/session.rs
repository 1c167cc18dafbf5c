//! Scoped session
//!
//! [`Session`] owns a logged-in [`Heatpump`] and guarantees that logout and
//! close run exactly once when it goes away, whatever the exit path.

use std::ops::{Deref, DerefMut};
use tracing::debug;

use super::{Heatpump, Link};
use crate::error::Result;

/// A logged-in heat pump that cleans up after itself
pub struct Session {
    heatpump: Heatpump,
    finished: bool,
}

impl Session {
    /// Open the configured serial port and log in
    pub fn open(heatpump: Heatpump) -> Result<Self> {
        Self::start(heatpump, |hp| hp.open_connection())
    }

    /// Log in over an already open link
    pub fn with_link(heatpump: Heatpump, link: Box<dyn Link>) -> Result<Self> {
        Self::start(heatpump, move |hp| hp.attach(link))
    }

    fn start(
        heatpump: Heatpump,
        connect: impl FnOnce(&mut Heatpump) -> Result<()>,
    ) -> Result<Self> {
        // Built before connecting so a failed login is still cleaned up by Drop
        let mut session = Self {
            heatpump,
            finished: false,
        };
        connect(&mut session.heatpump)?;
        session.heatpump.login()?;
        Ok(session)
    }

    /// Log out and close now instead of at drop
    pub fn finish(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        debug!("Ending session");
        self.heatpump.logout();
        self.heatpump.close_connection();
    }
}

impl Deref for Session {
    type Target = Heatpump;

    fn deref(&self) -> &Heatpump {
        &self.heatpump
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Heatpump {
        &mut self.heatpump
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cleanup();
    }
}
