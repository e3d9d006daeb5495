use crate::error::AppError;

/// Lazy sliding windows over a borrowed slice.
///
/// Yields `(offset, &items[offset..offset + window_size])` for offsets
/// `0, step, 2 * step, ...` while the window still fits. A fresh call to
/// [`windows`] restarts from offset zero; the backing slice is never touched.
#[derive(Debug, Clone)]
pub struct Windows<'a, T> {
    items: &'a [T],
    window_size: usize,
    step_size: usize,
    next_offset: usize,
}

/// Build a window iterator. `step_size` defaults to `window_size` (non-overlapping).
///
/// A slice shorter than `window_size` yields nothing; that is not an error.
pub fn windows<T>(
    items: &[T],
    window_size: usize,
    step_size: Option<usize>,
) -> Result<Windows<'_, T>, AppError> {
    let step_size = step_size.unwrap_or(window_size);
    if window_size < 1 {
        return Err(AppError::invalid("window_size must be >= 1"));
    }
    if step_size < 1 {
        return Err(AppError::invalid("step_size must be >= 1"));
    }
    Ok(Windows {
        items,
        window_size,
        step_size,
        next_offset: 0,
    })
}

/// Number of windows [`windows`] produces for the given sizes.
pub fn window_count(len: usize, window_size: usize, step_size: usize) -> usize {
    if window_size == 0 || step_size == 0 || len < window_size {
        return 0;
    }
    (len - window_size) / step_size + 1
}

impl<'a, T> Windows<'a, T> {
    fn remaining(&self) -> usize {
        match self.items.len().checked_sub(self.next_offset) {
            Some(rest) => window_count(rest, self.window_size, self.step_size),
            None => 0,
        }
    }
}

impl<'a, T> Iterator for Windows<'a, T> {
    type Item = (usize, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_offset;
        let end = offset.checked_add(self.window_size)?;
        if end > self.items.len() {
            return None;
        }
        self.next_offset = offset.saturating_add(self.step_size);
        Some((offset, &self.items[offset..end]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for Windows<'_, T> {}

impl<T> std::iter::FusedIterator for Windows<'_, T> {}
