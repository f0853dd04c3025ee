// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "io.github.sethcottle.Tablon";
pub const APP_NAME: &str = "Tablon";

pub const DEFAULT_SERVICE_URL: &str = "https://api.tablon.app/v1";

/// Items requested per feed page when the settings don't say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Per-request timeout for the HTTP backend, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const USER_AGENT: &str = concat!("Tablon/", env!("CARGO_PKG_VERSION"));
