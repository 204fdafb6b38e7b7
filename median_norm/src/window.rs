use std::num::NonZeroUsize;

use crate::error::{invalid_arg, Result};

/// Fixed size genomic window
///
/// Windows tile the positive integers into contiguous blocks of `size` bases
/// starting from position 1, so with size 1000 the windows are [1, 1000],
/// [1001, 2000] etc.  Positions are 1-based; a position that is an exact
/// multiple of the size is the last base of its window, not the first base of
/// the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    size: NonZeroUsize,
}

impl Window {
    pub fn new(size: usize) -> Result<Self> {
        NonZeroUsize::new(size)
            .map(|size| Self { size })
            .ok_or_else(|| invalid_arg!("window size must be positive"))
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// First base of the window containing pos
    pub fn start(&self, pos: usize) -> Result<usize> {
        if pos == 0 {
            Err(invalid_arg!("position must be >= 1 (1-based coordinates)"))
        } else {
            let sz = self.size();
            Ok(((pos - 1) / sz) * sz + 1)
        }
    }

    /// Last base of the window containing pos
    pub fn end(&self, pos: usize) -> Result<usize> {
        self.bounds(pos).map(|(_, e)| e)
    }

    /// Inclusive (start, end) of the window containing pos
    ///
    /// Fails if the end of the window is not representable as a usize
    pub fn bounds(&self, pos: usize) -> Result<(usize, usize)> {
        let s = self.start(pos)?;
        s.checked_add(self.size() - 1)
            .map(|e| (s, e))
            .ok_or_else(|| invalid_arg!("window containing {} extends past usize::MAX", pos))
    }

    /// Midpoint of the window containing pos (rounded down)
    pub fn midpoint(&self, pos: usize) -> Result<usize> {
        let s = self.start(pos)?;
        s.checked_add((self.size() - 1) >> 1)
            .ok_or_else(|| invalid_arg!("window containing {} extends past usize::MAX", pos))
    }
}

pub fn window_start(size: usize, pos: usize) -> Result<usize> {
    Window::new(size)?.start(pos)
}

pub fn window_end(size: usize, pos: usize) -> Result<usize> {
    Window::new(size)?.end(pos)
}
