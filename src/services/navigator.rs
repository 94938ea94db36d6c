use crate::models::clip::Clip;

/// Sequential cursor over an ordered clip list.
///
/// The navigator owns only the index; the clips are borrowed per call and never
/// modified. Stepping clamps at both ends and never wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipNavigator {
    cursor: usize,
}

impl ClipNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Step forward; no-op on the last clip.
    pub fn next(&mut self, clips: &[Clip]) {
        if self.cursor + 1 < clips.len() {
            self.cursor += 1;
        }
    }

    /// Step back; no-op on the first clip.
    pub fn prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn current<'c>(&self, clips: &'c [Clip]) -> Result<&'c Clip, NavigationError> {
        clips.get(self.cursor).ok_or(NavigationError::EmptySequence)
    }

    /// 1-based `(position, total)` for "Clip i of n" labels, `None` when empty.
    pub fn position(&self, clips: &[Clip]) -> Option<(usize, usize)> {
        (!clips.is_empty()).then(|| (self.cursor + 1, clips.len()))
    }

    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_last(&self, clips: &[Clip]) -> bool {
        self.cursor + 1 >= clips.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("No clips to show")]
    EmptySequence,

    #[error("Job results are not available")]
    NotViewing,
}
