use platshim_kernel::{Platform, ShimConfig};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn parse_platform_or_exit(platform: &str) -> Platform {
    platform.parse().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn load_config_or_exit(path: &str) -> ShimConfig {
    ShimConfig::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn render_json_or_exit<T: Serialize>(payload: &T, what: &str) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {what} payload: {err}");
        std::process::exit(2);
    })
}

/// Write `contents` to `out`, creating parent directories, or print it.
pub fn emit_or_exit(contents: &str, out: Option<&str>) {
    let Some(out) = out else {
        print!("{contents}");
        if !contents.ends_with('\n') {
            println!();
        }
        return;
    };
    let path = Path::new(out);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("error: failed to create {}: {e}", parent.display());
            std::process::exit(1);
        });
    }
    fs::write(path, contents).unwrap_or_else(|e| {
        eprintln!("error: failed to write {}: {e}", path.display());
        std::process::exit(1);
    });
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
