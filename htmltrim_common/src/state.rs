use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    interceptor::{TrimSwitch, DEFAULT_MAX_BODY_SIZE},
    rewriting::html::WhitespaceRewriter,
};

const fn default_trim_enabled() -> bool {
    true
}

const fn default_trim_max_body() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// The listen address of the server
    pub host: SocketAddr,
    /// The directory whose files are served, with HTML pages trimmed on the way out
    pub root: PathBuf,
    /// Whether whitespace trimming starts out enabled
    #[serde(default = "default_trim_enabled")]
    pub trim_enabled: bool,
    /// HTML bodies longer than this many bytes are served untrimmed
    #[serde(default = "default_trim_max_body")]
    pub trim_max_body: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: SocketAddr::from(([0, 0, 0, 0], 3069)),
            root: PathBuf::from("public"),
            trim_enabled: default_trim_enabled(),
            trim_max_body: default_trim_max_body(),
        }
    }
}

#[derive(Clone)]
/// The state that is passed to the API routes
pub struct APIState {
    pub config: Arc<Config>,
    pub switch: TrimSwitch,
    pub rewriter: Arc<WhitespaceRewriter>,
}
