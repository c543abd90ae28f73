use std::path::Path;

use crate::utils::text::shell_quote;

/// Layers compression piping and file redirection over a base export
/// command. The base string arrives fully escaped from the engine; only
/// the pipe/redirection operators here are literal shell syntax.
pub fn export_pipeline(
    base: &str,
    target: &Path,
    compressor: Option<&Path>,
    suppress_stderr: bool,
) -> String {
    let target = shell_quote(&target.to_string_lossy());
    let mut command = match compressor {
        Some(bin) => format!("{base} | {} > {target}", shell_quote(&bin.to_string_lossy())),
        None => format!("{base} > {target}"),
    };
    if suppress_stderr {
        command.push_str(" 2>/dev/null");
    }
    command
}

/// Layers decompression piping over a base import command. Compressed
/// sources are streamed through `<decompressor> -dc`, plain ones are fed
/// straight to the client's stdin.
pub fn import_pipeline(base: &str, source: &Path, decompressor: Option<&Path>) -> String {
    let source = shell_quote(&source.to_string_lossy());
    match decompressor {
        Some(bin) => format!(
            "{} -dc {source} | {base}",
            shell_quote(&bin.to_string_lossy())
        ),
        None => format!("{base} < {source}"),
    }
}
