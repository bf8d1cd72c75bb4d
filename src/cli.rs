use crate::backend::render_graph;
use crate::config::{RenderMode, load_config};
use crate::dot::write_dot;
use crate::layout::build_flowchart;
use crate::layout_dump::layout_dump_json;
use crate::parser::parse_c;
use crate::preprocess::preprocess_source;
use crate::render::write_output_svg;
use crate::Config;
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cflowchart",
    version,
    about = "Flowcharts of C functions with pinned coordinates"
)]
pub struct Args {
    /// Input file (.c, or .md with ```c blocks) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for svg, dot and json.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// SVG backend; overrides the config file
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<Mode>,

    /// Graphviz engine used by `--mode graphviz`
    #[arg(long = "engine")]
    pub engine: Option<String>,

    /// Write the parsed syntax tree to this file
    #[arg(long = "dump-ast")]
    pub dump_ast: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Dot,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Mode {
    Native,
    Graphviz,
    Online,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Native => RenderMode::Native,
            Mode::Graphviz => RenderMode::Graphviz,
            Mode::Online => RenderMode::Online,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.render.mode = mode.into();
    }
    if let Some(engine) = &args.engine {
        config.render.engine = engine.clone();
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let sources = if is_markdown {
        extract_c_blocks(&input)
    } else {
        vec![input]
    };

    if sources.is_empty() {
        return Err(anyhow::anyhow!("No C code blocks found in input"));
    }

    if sources.len() == 1 {
        let output = match args.output_format {
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
            _ => args.output.clone(),
        };
        return generate_one(
            &sources[0],
            &config,
            args.output_format,
            output.as_deref(),
            args.dump_ast.as_deref(),
        );
    }

    // Multiple code blocks (Markdown input)
    info!(blocks = sources.len(), "rendering markdown code blocks");
    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, sources.len())?;
    let dumps = match &args.dump_ast {
        Some(base) => numbered_paths(base, "txt", sources.len())
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; sources.len()],
    };
    for ((source, output), dump) in sources.iter().zip(&outputs).zip(&dumps) {
        generate_one(source, &config, args.output_format, Some(output), dump.as_deref())?;
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when run() is embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn generate_one(
    source: &str,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
    dump_ast: Option<&Path>,
) -> Result<()> {
    let unit = parse_c(&preprocess_source(source))?;
    if let Some(path) = dump_ast {
        std::fs::write(path, format!("{unit:#?}\n"))?;
        debug!(path = %path.display(), "wrote syntax tree");
    }
    let graph = build_flowchart(&unit, &config.layout);

    match format {
        OutputFormat::Svg => {
            let svg = render_graph(&graph, config)?;
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Png => {
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let svg = render_graph(&graph, config)?;
            write_png(&svg, output, config)?;
        }
        OutputFormat::Dot => write_text(&write_dot(&graph, config), output)?,
        OutputFormat::Json => write_text(&layout_dump_json(&graph)?, output)?,
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output needs the `png` feature"))
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn extract_c_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_c_fence(trimmed) {
                in_block = true;
                fence = start_fence;
                continue;
            }
        } else if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }

        if in_block {
            current.push(line.to_string());
        }
    }

    blocks
}

fn detect_c_fence(line: &str) -> Option<String> {
    for marker in ["```", "~~~"] {
        if line.starts_with(marker) {
            let fence_char = marker.chars().next()?;
            let rest = line.trim_start_matches(fence_char).trim();
            let lang = rest.split_whitespace().next().unwrap_or("");
            if matches!(lang, "c" | "C" | "h") {
                return Some(marker.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    Ok(numbered_paths(base, format.extension(), count))
}

fn numbered_paths(base: &Path, ext: &str, count: usize) -> Vec<PathBuf> {
    if base.is_dir() {
        return (0..count)
            .map(|idx| base.join(format!("flowchart-{}.{}", idx + 1, ext)))
            .collect();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("flowchart");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    (0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_c_blocks() {
        let input = r#"
text
``` c
int main() {
  return 1;
}
```
more
```rust
fn main() {}
```
~~~c
void f() {}
~~~
```cpp
int g();
```
"#;
        let blocks = extract_c_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("int main()"));
        assert_eq!(blocks[1], "void f() {}");
    }

    #[test]
    fn unterminated_block_is_dropped() {
        assert!(extract_c_blocks("```c\nint main() {}\n").is_empty());
    }

    #[test]
    fn fence_end_needs_a_bare_fence() {
        assert!(is_fence_end("```", "```"));
        assert!(is_fence_end("```  ", "```"));
        assert!(!is_fence_end("```c", "```"));
        assert!(!is_fence_end("~~~", "```"));
    }

    #[test]
    fn multi_outputs_are_numbered_beside_the_base() {
        let outputs =
            resolve_multi_outputs(Some(Path::new("out/chart.svg")), OutputFormat::Dot, 2).unwrap();
        assert_eq!(
            outputs,
            vec![PathBuf::from("out/chart-1.dot"), PathBuf::from("out/chart-2.dot")]
        );
    }

    #[test]
    fn multi_outputs_need_a_path() {
        assert!(resolve_multi_outputs(None, OutputFormat::Svg, 2).is_err());
    }

    #[test]
    fn cli_mode_maps_to_render_mode() {
        assert_eq!(RenderMode::from(Mode::Graphviz), RenderMode::Graphviz);
        assert_eq!(RenderMode::from(Mode::Native), RenderMode::Native);
    }
}
