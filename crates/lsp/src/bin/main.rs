use tower_lsp::{LspService, Server};

use vala_lsp_lsp::LspBackend;
use vala_lsp_lsp::logging::init_logging;

#[tokio::main]
async fn main() {
    // stdout is reserved for the protocol; all diagnostics go to a log
    // file under the temp directory.
    match init_logging() {
        Some(path) => eprintln!("vala-lsp: logging to {}", path.display()),
        None => eprintln!("vala-lsp: could not create log file, logging disabled"),
    }

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(LspBackend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
