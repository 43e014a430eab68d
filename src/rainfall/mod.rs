//! Rainfall: how water enters the grid and how an episode is driven to
//! completion.

mod episode;
mod source;

pub use episode::{EpisodeConfig, EpisodeError, EpisodeReport, RainfallEpisode};
pub use source::RainSource;
