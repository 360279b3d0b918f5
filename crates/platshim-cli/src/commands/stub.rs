use crate::support::emit_or_exit;
use platshim_kernel::{StubFormat, StubModule};

pub fn run(module: String, format: StubFormat, exports: Vec<String>, out: Option<String>) {
    let stub = StubModule::new(module, exports).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    emit_or_exit(&stub.render(format), out.as_deref());
}
