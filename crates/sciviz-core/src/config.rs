//! Environment-driven configuration (`SCIVIZ_*` variables).

use std::path::PathBuf;

use crate::introspect::governor::{
    Limits, MAX_DIM, MAX_ELEMENTS, MAX_SLICES, MAX_TRAVERSAL_DEPTH,
};

pub const DEFAULT_OUTPUT_DIR: &str = "static/images";
pub const DEFAULT_PUBLIC_BASE: &str = "/static/images";

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => {
            let v = val.trim().to_lowercase();
            if default {
                !matches!(v.as_str(), "0" | "false" | "no" | "off")
            } else {
                matches!(v.as_str(), "1" | "true" | "yes" | "on")
            }
        }
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct SciVizConfig {
    pub output_dir: PathBuf,
    pub public_base: String,
    pub limits: Limits,
    /// Place each traversal's artifacts in their own directory.
    pub request_scoped: bool,
}

impl Default for SciVizConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            public_base: DEFAULT_PUBLIC_BASE.to_string(),
            limits: Limits::default(),
            request_scoped: true,
        }
    }
}

impl SciVizConfig {
    /// Build config from `SCIVIZ_*` environment variables. Absent or
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            output_dir: PathBuf::from(env_string("SCIVIZ_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            public_base: env_string("SCIVIZ_PUBLIC_BASE", DEFAULT_PUBLIC_BASE),
            limits: Limits {
                max_elements: env_usize("SCIVIZ_MAX_ELEMENTS", MAX_ELEMENTS),
                max_dim: env_usize("SCIVIZ_MAX_DIM", MAX_DIM),
                max_slices: env_usize("SCIVIZ_MAX_SLICES", MAX_SLICES),
                max_depth: env_usize("SCIVIZ_MAX_DEPTH", MAX_TRAVERSAL_DEPTH),
            },
            request_scoped: env_flag("SCIVIZ_REQUEST_SCOPED", true),
        }
    }
}
