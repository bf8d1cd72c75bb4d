use crate::config::{Config, RenderConfig, RenderMode};
use crate::dot::write_dot;
use crate::error::{Error, Result};
use crate::ir::FlowGraph;
use crate::render::render_svg;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Renders `graph` to SVG with the backend selected by `config.render.mode`.
pub fn render_graph(graph: &FlowGraph, config: &Config) -> Result<String> {
    match config.render.mode {
        RenderMode::Native => Ok(render_svg(graph, config)),
        RenderMode::Graphviz => render_with_graphviz(&write_dot(graph, config), &config.render),
        RenderMode::Online => render_online(&write_dot(graph, config), &config.render),
    }
}

/// Pipes the description through a local Graphviz engine (`fdp -Tsvg`).
fn render_with_graphviz(dot: &str, render: &RenderConfig) -> Result<String> {
    debug!(engine = %render.engine, bytes = dot.len(), "invoking graphviz");
    let mut child = Command::new(&render.engine)
        .arg("-Tsvg")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| Error::Render(format!("failed to start `{}`: {err}", render.engine)))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(dot.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(Error::Render(format!(
            "`{}` exited with {}: {}",
            render.engine,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|err| Error::Render(format!("`{}` produced invalid UTF-8: {err}", render.engine)))
}

#[cfg(feature = "online")]
fn render_online(dot: &str, render: &RenderConfig) -> Result<String> {
    debug!(url = %render.online_url, bytes = dot.len(), "posting to online renderer");
    match ureq::post(&render.online_url)
        .set("Content-Type", "text/plain")
        .send_string(dot)
    {
        Ok(response) => response
            .into_string()
            .map_err(|err| Error::Render(format!("reading response: {err}"))),
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(Error::Render(format!(
                "{} returned {code}: {}",
                render.online_url,
                body.trim()
            )))
        }
        Err(err) => Err(Error::Render(err.to_string())),
    }
}

#[cfg(not(feature = "online"))]
fn render_online(_dot: &str, _render: &RenderConfig) -> Result<String> {
    Err(Error::Render(
        "online rendering needs the `online` feature".to_string(),
    ))
}
