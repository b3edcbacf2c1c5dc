//! Console screen-buffer reader.

#![allow(unsafe_code)]

use std::mem::MaybeUninit;

use windows_sys::Win32::Foundation::{GetLastError, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Console::{
    CONSOLE_CURSOR_INFO, CONSOLE_SCREEN_BUFFER_INFO, COORD, GetConsoleCursorInfo,
    GetConsoleScreenBufferInfo, GetStdHandle, ReadConsoleOutputAttribute,
    ReadConsoleOutputCharacterW, STD_OUTPUT_HANDLE,
};

use crate::config::WindowSize;
use crate::error::{PtyError, Result};
use crate::screen::{Cell, CellAttributes, ScreenRow, ScreenSnapshot, ScreenSource};

fn last_error(call: &str) -> PtyError {
    // SAFETY: GetLastError has no preconditions.
    let code = unsafe { GetLastError() };
    PtyError::Console {
        message: call.into(),
        code,
    }
}

/// Reader for the process's standard output console.
#[derive(Debug)]
pub struct WindowsConsole {
    handle: HANDLE,
}

// SAFETY: the standard output handle is process-wide and the console API
// may be called from any thread.
unsafe impl Send for WindowsConsole {}

impl WindowsConsole {
    /// Attach to the standard output console.
    pub fn stdout() -> Result<Self> {
        // SAFETY: GetStdHandle has no preconditions.
        let handle = unsafe { GetStdHandle(STD_OUTPUT_HANDLE) };
        if handle == INVALID_HANDLE_VALUE || handle.is_null() {
            return Err(last_error("GetStdHandle"));
        }
        Ok(Self { handle })
    }

    fn buffer_info(&self) -> Result<CONSOLE_SCREEN_BUFFER_INFO> {
        let mut info = MaybeUninit::<CONSOLE_SCREEN_BUFFER_INFO>::uninit();
        // SAFETY: handle is a console handle and info is a valid out pointer.
        let ok = unsafe { GetConsoleScreenBufferInfo(self.handle, info.as_mut_ptr()) };
        if ok == 0 {
            return Err(last_error("GetConsoleScreenBufferInfo"));
        }
        // SAFETY: the call succeeded and filled the struct.
        let info = unsafe { info.assume_init() };
        Ok(info)
    }

    fn cursor_visible(&self) -> Result<bool> {
        let mut info = CONSOLE_CURSOR_INFO {
            dwSize: 0,
            bVisible: 0,
        };
        // SAFETY: handle is a console handle and info is a valid out pointer.
        let ok = unsafe { GetConsoleCursorInfo(self.handle, &mut info) };
        if ok == 0 {
            return Err(last_error("GetConsoleCursorInfo"));
        }
        Ok(info.bVisible != 0)
    }

    fn read_row(&self, origin: COORD, width: usize) -> Result<ScreenRow> {
        let mut chars = vec![0u16; width];
        let mut attrs = vec![0u16; width];
        let mut read = 0u32;

        // SAFETY: both buffers hold `width` elements.
        let ok = unsafe {
            ReadConsoleOutputCharacterW(
                self.handle,
                chars.as_mut_ptr(),
                width as u32,
                origin,
                &mut read,
            )
        };
        if ok == 0 {
            return Err(last_error("ReadConsoleOutputCharacterW"));
        }
        chars.truncate(read as usize);

        // SAFETY: as above.
        let ok = unsafe {
            ReadConsoleOutputAttribute(
                self.handle,
                attrs.as_mut_ptr(),
                width as u32,
                origin,
                &mut read,
            )
        };
        if ok == 0 {
            return Err(last_error("ReadConsoleOutputAttribute"));
        }
        attrs.truncate(read as usize);

        let cells = char::decode_utf16(chars.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .zip(attrs.iter().copied())
            .map(|(ch, a)| Cell::new(ch, CellAttributes::from_bits_retain(a)))
            .collect();

        Ok(ScreenRow { cells })
    }
}

impl ScreenSource for WindowsConsole {
    fn snapshot(&mut self) -> Result<ScreenSnapshot> {
        let info = self.buffer_info()?;
        let window = info.srWindow;
        let width = (window.Right - window.Left + 1).max(0) as u16;
        let height = (window.Bottom - window.Top + 1).max(0) as u16;

        let mut rows = Vec::with_capacity(height as usize);
        for y in window.Top..=window.Bottom {
            let origin = COORD {
                X: window.Left,
                Y: y,
            };
            rows.push(self.read_row(origin, width as usize)?);
        }

        let cursor = info.dwCursorPosition;
        Ok(ScreenSnapshot {
            size: WindowSize::new(width, height),
            rows,
            cursor_x: (cursor.X - window.Left).max(0) as u16,
            cursor_y: (cursor.Y - window.Top).max(0) as u16,
            cursor_visible: self.cursor_visible()?,
        })
    }
}

/// Visible size of the standard output console.
pub fn console_size() -> Result<WindowSize> {
    let console = WindowsConsole::stdout()?;
    let window = console.buffer_info()?.srWindow;
    Ok(WindowSize::new(
        (window.Right - window.Left + 1).max(0) as u16,
        (window.Bottom - window.Top + 1).max(0) as u16,
    ))
}
