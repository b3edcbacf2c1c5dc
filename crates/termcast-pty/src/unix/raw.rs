//! Raw terminal mode.
//!
//! [`make_raw`] is the pure attribute transformation; [`RawModeGuard`]
//! applies it to a live descriptor and puts the saved attributes back when
//! dropped. A [`ModeRestorer`] carries a copy of the saved state to places
//! that cannot hold the guard, such as an interrupt handler thread.

use std::os::unix::io::{AsFd, OwnedFd};

use rustix::termios::{
    ControlModes, InputModes, LocalModes, OptionalActions, OutputModes, SpecialCodeIndex, Termios,
    tcgetattr, tcsetattr,
};

use crate::error::{PtyError, Result, os_error};

fn query_failed(errno: rustix::io::Errno) -> PtyError {
    PtyError::GetAttributes(os_error(errno))
}

/// Transform `termios` into raw mode in place.
///
/// Clears break/parity/strip/CR-NL mapping and flow control on input, all
/// output post-processing, echo, canonical mode, signal keys and extended
/// processing; forces 8-bit characters without parity; sets `VMIN = 1` and
/// `VTIME = 0`. Nothing else is touched, so applying it twice is the same as
/// applying it once.
pub fn make_raw(termios: &mut Termios) {
    termios.input_modes &= !(InputModes::IGNBRK
        | InputModes::BRKINT
        | InputModes::PARMRK
        | InputModes::ISTRIP
        | InputModes::INLCR
        | InputModes::IGNCR
        | InputModes::ICRNL
        | InputModes::IXON);
    termios.output_modes &= !OutputModes::OPOST;
    termios.local_modes &= !(LocalModes::ECHO
        | LocalModes::ECHONL
        | LocalModes::ICANON
        | LocalModes::ISIG
        | LocalModes::IEXTEN);
    termios.control_modes &= !(ControlModes::CSIZE | ControlModes::PARENB);
    termios.control_modes |= ControlModes::CS8;
    termios.special_codes[SpecialCodeIndex::VMIN] = 1;
    termios.special_codes[SpecialCodeIndex::VTIME] = 0;
}

/// Saved terminal attributes plus a descriptor to put them back on.
#[derive(Debug)]
pub struct ModeRestorer {
    fd: OwnedFd,
    saved: Termios,
}

impl ModeRestorer {
    /// Reapply the saved attributes.
    pub fn restore(&self) -> Result<()> {
        tcsetattr(&self.fd, OptionalActions::Now, &self.saved)
            .map_err(|e| PtyError::SetAttributes(os_error(e)))
    }

    /// The attributes that will be restored.
    #[must_use]
    pub const fn saved(&self) -> &Termios {
        &self.saved
    }
}

/// Holds a terminal in raw mode until dropped.
#[derive(Debug)]
pub struct RawModeGuard {
    restorer: ModeRestorer,
    active: bool,
}

impl RawModeGuard {
    /// Save the attributes of `fd` and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// `GetAttributes` if the descriptor cannot be duplicated or queried,
    /// `SetAttributes` if the mode change is rejected. Nothing is changed on
    /// error.
    pub fn enter(fd: impl AsFd) -> Result<Self> {
        let fd = rustix::io::fcntl_dupfd_cloexec(fd, 0).map_err(query_failed)?;
        let saved = tcgetattr(&fd).map_err(query_failed)?;

        let mut raw = saved.clone();
        make_raw(&mut raw);
        tcsetattr(&fd, OptionalActions::Now, &raw)
            .map_err(|e| PtyError::SetAttributes(os_error(e)))?;

        tracing::trace!("terminal switched to raw mode");
        Ok(Self {
            restorer: ModeRestorer { fd, saved },
            active: true,
        })
    }

    /// An independent handle that restores the same saved state.
    pub fn restorer(&self) -> Result<ModeRestorer> {
        Ok(ModeRestorer {
            fd: rustix::io::fcntl_dupfd_cloexec(&self.restorer.fd, 0)?,
            saved: self.restorer.saved.clone(),
        })
    }

    /// Restore the saved attributes now. Later calls and the drop are no-ops.
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.restorer.restore()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(error = %e, "failed to restore terminal mode");
        }
    }
}
