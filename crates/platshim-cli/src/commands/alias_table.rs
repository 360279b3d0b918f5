use crate::support::{emit_or_exit, load_config_or_exit, parse_platform_or_exit};
use platshim_pipeline::AliasTable;
use std::fs;
use std::path::Path;

pub fn run(platform: String, config: String, out: Option<String>) {
    let platform = parse_platform_or_exit(&platform);
    let config = load_config_or_exit(&config);

    let table_dir = out
        .as_deref()
        .and_then(|out| Path::new(out).parent())
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(table_dir).unwrap_or_else(|e| {
        eprintln!("error: failed to create {}: {e}", table_dir.display());
        std::process::exit(1);
    });

    let table = AliasTable::derive(config.rules(), platform).anchored_at(table_dir, config.root());
    let rendered = table.to_json_pretty().unwrap_or_else(|err| {
        eprintln!("error: failed to render alias table: {err}");
        std::process::exit(2);
    });
    emit_or_exit(&rendered, out.as_deref());
}
