// SPDX-License-Identifier: MPL-2.0

mod session;
pub mod settings;

pub use session::{Generation, SessionEpoch};
pub use settings::{FeedSettings, SettingsError};
