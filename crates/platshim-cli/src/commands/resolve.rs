use crate::support::{
    load_config_or_exit, parse_platform_or_exit, render_json_or_exit, yes_no,
};
use platshim_kernel::{ModuleBinding, ModuleId, RequestContext, ResolutionRequest};
use platshim_pipeline::InterceptPipeline;
use serde_json::json;
use tracing::warn;

pub fn run(
    module: String,
    platform: String,
    config: String,
    origin: Option<String>,
    json_output: bool,
) {
    let platform = parse_platform_or_exit(&platform);
    let config = load_config_or_exit(&config);
    let module = ModuleId::new(module).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let context = origin
        .map(RequestContext::from_origin)
        .unwrap_or_default();
    let binding = ModuleBinding::select(config.rules(), &module, platform);
    let substituted = !binding.is_functional();
    let request = ResolutionRequest::new(context, module, platform);

    let pipeline = InterceptPipeline::install_unverified(&config, None);
    let resolution = pipeline.resolve(&request).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    let replacement_exists =
        substituted.then(|| resolution.file_path().is_some_and(|path| path.is_file()));
    if replacement_exists == Some(false) {
        warn!(
            module = %request.module,
            platform = %request.platform,
            "replacement file is missing; a build would fail here"
        );
    }

    if json_output {
        let payload = json!({
            "module": request.module,
            "platform": request.platform,
            "substituted": substituted,
            "binding": binding,
            "replacementExists": replacement_exists,
            "resolution": resolution,
            "ruleDigest": pipeline.rule_digest(),
        });
        println!("{}", render_json_or_exit(&payload, "resolve"));
        return;
    }

    println!("platshim resolve");
    println!("  Module: {}", request.module);
    println!("  Platform: {}", request.platform);
    println!("  Substituted: {}", yes_no(substituted));
    match resolution.file_path() {
        Some(path) => println!("  File: {}", path.display()),
        None => println!("  Resolution: {resolution:?}"),
    }
    if let Some(exists) = replacement_exists {
        println!("  Replacement exists: {}", yes_no(exists));
    }
    println!("  Rule digest: {}", pipeline.rule_digest());
}
