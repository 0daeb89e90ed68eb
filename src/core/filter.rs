//! Map cross-filter controller.
//!
//! A [`FilterSession`] holds the filter of one user session. Updating it
//! reports whether the map has to be redrawn; selecting points is a pure
//! function of the dataset and a [`FilterState`].

use crate::domain::model::{FilterKind, FilterState, Payload, ProjectPoint};
use crate::utils::error::Result;

/// Outcome of a filter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Needed,
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    state: FilterState,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Replaces the state. Redraw is only requested when the new state
    /// differs by value from the current one.
    pub fn set(&mut self, next: FilterState) -> Redraw {
        if self.state == next {
            tracing::debug!("Filter unchanged ({}), skipping redraw", next);
            return Redraw::Skipped;
        }
        tracing::debug!("Filter {} -> {}", self.state, next);
        self.state = next;
        Redraw::Needed
    }

    /// Builds the state from a textual kind and payload, then applies it.
    /// On error the current state is left as it was.
    pub fn set_filter(&mut self, kind: &str, payload: &Payload) -> Result<Redraw> {
        let kind: FilterKind = kind.parse()?;
        let next = FilterState::from_kind(kind, payload)?;
        Ok(self.set(next))
    }

    pub fn reset(&mut self) -> Redraw {
        self.set(FilterState::All)
    }
}

/// Points to draw on the map for `state`, in input order.
///
/// Points without both coordinates are dropped before the filter is
/// applied, for every variant including [`FilterState::All`].
pub fn select_points<'a>(points: &'a [ProjectPoint], state: &FilterState) -> Vec<&'a ProjectPoint> {
    points
        .iter()
        .filter(|p| p.coordinates().is_some())
        .filter(|p| state.matches(p))
        .collect()
}
