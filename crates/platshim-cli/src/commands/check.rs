use crate::support::{
    load_config_or_exit, parse_platform_or_exit, render_json_or_exit, yes_no,
};
use platshim_pipeline::{AliasTable, check_pipelines};

pub fn run(config: String, alias_table: Option<String>, platform: String, json_output: bool) {
    let platform = parse_platform_or_exit(&platform);
    let config = load_config_or_exit(&config);
    let committed = alias_table.map(|path| {
        AliasTable::load(&path, platform).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        })
    });
    let report = check_pipelines(&config, committed.as_ref(), platform);

    if json_output {
        println!("{}", render_json_or_exit(&report, "check"));
    } else {
        println!("platshim check");
        println!("  Check kind: {}", report.check_kind);
        println!("  Platform: {}", report.platform);
        println!("  Result: {}", report.result);
        println!("  Rules: {}", report.rule_count);
        println!("  Rule digest: {}", report.rule_digest);
        println!("  Alias table checked: {}", yes_no(report.alias_checked));
        println!("  Issues: {}", report.issues.len());
        for issue in &report.issues {
            println!(
                "    - [{}] {}: {}",
                issue.failure_class, issue.path, issue.message
            );
        }
        println!("  Semantic digest: {}", report.semantic_digest);
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}
