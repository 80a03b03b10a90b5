//! Load lifecycle for a single pipeline run: Idle -> Loading -> Success | Failed

use crate::models::Device;

use super::{render, Page};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Success(Vec<Device>),
    Failed(String),
}

impl LoadState {
    /// Idle -> Loading. Returns false (and changes nothing) from any other state.
    pub fn begin(&mut self) -> bool {
        match self {
            LoadState::Idle => {
                *self = LoadState::Loading;
                true
            }
            _ => false,
        }
    }

    /// Loading -> Success/Failed, at most once per run.
    /// Terminal states are never left; a new run needs a new `LoadState`.
    pub fn finish<E: ToString>(&mut self, result: Result<Vec<Device>, E>) -> bool {
        if !matches!(self, LoadState::Loading) {
            return false;
        }

        *self = match result {
            Ok(devices) => LoadState::Success(devices),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        true
    }

    pub fn page(&self) -> Page {
        match self {
            LoadState::Idle => render(&[], None),
            LoadState::Loading => Page::Loading,
            LoadState::Success(devices) => render(devices, None),
            LoadState::Failed(message) => render(&[], Some(message)),
        }
    }
}
