pub mod ast;
pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dot;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod preprocess;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{Error, Result};
pub use ir::FlowGraph;

/// Strips comments and directives, parses `source` and lays out one cluster
/// per function. Each call works on its own graph and cursor.
pub fn generate(source: &str, config: &Config) -> Result<FlowGraph> {
    let cleaned = preprocess::preprocess_source(source);
    let unit = parser::parse_c(&cleaned)?;
    Ok(layout::build_flowchart(&unit, &config.layout))
}

/// [`generate`] followed by the configured SVG backend.
pub fn generate_svg(source: &str, config: &Config) -> Result<String> {
    let graph = generate(source, config)?;
    backend::render_graph(&graph, config)
}
