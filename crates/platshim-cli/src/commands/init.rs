use crate::support::{render_json_or_exit, yes_no};
use platshim_kernel::{DEFAULT_CONFIG_FILE, ShimConfig, StubFormat, StubModule};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const STUB_DIR: &str = "shims";
const STUB_STEM: &str = "react-native-maps.web";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutcome {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub stub_paths: Vec<PathBuf>,
    pub created_project_root: bool,
    pub created_config: bool,
    pub created_stubs: usize,
}

pub fn init_layout(path: impl AsRef<Path>) -> Result<InitOutcome, String> {
    let project_root = path.as_ref().to_path_buf();

    let mut created_project_root = false;
    if !project_root.exists() {
        fs::create_dir_all(&project_root)
            .map_err(|e| format!("failed to create init path {}: {e}", project_root.display()))?;
        created_project_root = true;
    }
    if !project_root.is_dir() {
        return Err(format!(
            "init path is not a directory: {}",
            project_root.display()
        ));
    }

    let stub_dir = project_root.join(STUB_DIR);
    fs::create_dir_all(&stub_dir)
        .map_err(|e| format!("failed to create stub directory {}: {e}", stub_dir.display()))?;

    let stub = StubModule::react_native_maps();
    let mut stub_paths = Vec::new();
    let mut created_stubs = 0;
    for format in [StubFormat::CommonJs, StubFormat::EsModule] {
        let stub_path = stub_dir.join(format!("{STUB_STEM}.{}", format.extension()));
        if write_if_absent(&stub_path, &stub.render(format))? {
            created_stubs += 1;
        }
        stub_paths.push(stub_path);
    }

    let config_path = project_root.join(DEFAULT_CONFIG_FILE);
    let replacement = format!("{STUB_DIR}/{STUB_STEM}.{}", StubFormat::CommonJs.extension());
    let config = ShimConfig::starter(&project_root, replacement).map_err(|e| e.to_string())?;
    let rendered = config
        .to_toml()
        .map_err(|e| format!("failed to render {}: {e}", config_path.display()))?;
    let created_config = write_if_absent(&config_path, &rendered)?;

    Ok(InitOutcome {
        project_root,
        config_path,
        stub_paths,
        created_project_root,
        created_config,
        created_stubs,
    })
}

/// Existing files are left untouched so `init` can be re-run safely.
fn write_if_absent(path: &Path, contents: &str) -> Result<bool, String> {
    if path.exists() {
        if !path.is_file() {
            return Err(format!("path exists but is not a file: {}", path.display()));
        }
        return Ok(false);
    }
    fs::write(path, contents).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    Ok(true)
}

pub fn run(path: String, json_output: bool) {
    let outcome = init_layout(&path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if json_output {
        println!("{}", render_json_or_exit(&outcome, "init"));
        return;
    }

    println!("platshim init");
    println!("  Project root: {}", outcome.project_root.display());
    println!("  Config: {}", outcome.config_path.display());
    println!("  Config created: {}", yes_no(outcome.created_config));
    for stub_path in &outcome.stub_paths {
        println!("  Stub: {}", stub_path.display());
    }
    println!("  Stubs created: {}", outcome.created_stubs);
}
