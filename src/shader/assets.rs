//! Embedded Shader Assets
//!
//! Built-in chunks, default entry templates and the stage wrapper live as
//! `.wgsl` files under `src/shader/wgsl` and are embedded into the binary.
//!
//! The stage wrapper is a minijinja template using the engine's shader syntax:
//!
//! | Construct       | Delimiters  |
//! |-----------------|-------------|
//! | Blocks          | `{$ ... $}` |
//! | Variables       | `{{ ... }}` |
//! | Line statements | `$$ ...`    |

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, syntax::SyntaxConfig};
use rust_embed::RustEmbed;

use super::stage::Stage;

static STAGE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/shader/wgsl"]
struct ShaderAssets;

const CHUNK_DIR: &str = "chunks/";
const TEMPLATE_DIR: &str = "templates/";

/// Name of the wrapper template rendered around every stage.
pub(crate) const STAGE_WRAPPER: &str = "stage";

pub(crate) fn stage_env() -> &'static Environment<'static> {
    STAGE_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        env.set_loader(template_loader);

        env
    })
}

fn template_loader(name: &str) -> Result<Option<String>, Error> {
    Ok(load_source(&format!("{TEMPLATE_DIR}{}", with_extension(name))))
}

fn with_extension(name: &str) -> Cow<'_, str> {
    if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    }
}

fn load_source(path: &str) -> Option<String> {
    let file = ShaderAssets::get(path)?;
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Some(source.to_owned()),
        Err(e) => {
            log::warn!("Embedded shader asset '{path}' is not UTF-8: {e}");
            None
        }
    }
}

/// Default entry template for `stage` (`@<stage>(input) -> output { {{<stage>}} ... }`).
pub(crate) fn default_entry_template(stage: Stage) -> Option<String> {
    load_source(&format!("{TEMPLATE_DIR}{}.wgsl", stage.name()))
}

/// `(name, source)` of every built-in chunk, sorted by name.
pub(crate) fn builtin_chunk_sources() -> Vec<(String, String)> {
    let mut sources: Vec<_> = ShaderAssets::iter()
        .filter_map(|path| {
            let name = path.strip_prefix(CHUNK_DIR)?.strip_suffix(".wgsl")?.to_owned();
            let source = load_source(&path)?;
            Some((name, source))
        })
        .collect();
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    sources
}
