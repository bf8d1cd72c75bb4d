use crate::error::{Error, Result};
use crate::ir::ArrowHead;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry and labelling options read by the construct handlers.
///
/// Distances are in layout units (Graphviz inches); `y` grows upwards, so a
/// function is drawn from `y = 0` towards negative values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub row_height: f32,
    pub center_x: f32,
    pub branch_spacing: f32,
    pub side_branch_offset: f32,
    pub loop_outer_margin: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub special_shape_width: f32,
    pub start_end_height: f32,
    pub width_factor: usize,
    pub function_gap: f32,
    pub edge_arrows: ArrowHead,
    pub loopback_arrows: ArrowHead,
    pub edge_weight: u32,
    pub loop_edge_weight: u32,
    pub output_prefix: String,
    pub input_prefix: String,
    pub title_prefix: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: 1.5,
            center_x: 12.0,
            branch_spacing: 3.0,
            side_branch_offset: 1.3,
            loop_outer_margin: 1.5,
            node_width: 1.5,
            node_height: 1.0,
            special_shape_width: 2.0,
            start_end_height: 0.5,
            width_factor: 16,
            function_gap: 3.0,
            edge_arrows: ArrowHead::Normal,
            loopback_arrows: ArrowHead::Vee,
            edge_weight: 50,
            loop_edge_weight: 55,
            output_prefix: "Output".to_string(),
            input_prefix: "Input".to_string(),
            title_prefix: "Flowchart of".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn half_row(&self) -> f32 {
        self.row_height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Built-in SVG renderer.
    Native,
    /// Local Graphviz executable.
    Graphviz,
    /// Kroki web service.
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub mode: RenderMode,
    pub engine: String,
    pub online_url: String,
    pub node_fontsize: f32,
    pub edge_fontsize: f32,
    pub cluster_fontsize: f32,
    pub node_penwidth: f32,
    pub edge_penwidth: f32,
    pub cluster_margin: f32,
    pub nodesep: f32,
    pub overlap: String,
    /// Pixels per layout unit for the native renderer.
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Native,
            engine: "fdp".to_string(),
            online_url: "https://kroki.io/graphviz/svg".to_string(),
            node_fontsize: 16.0,
            edge_fontsize: 16.0,
            cluster_fontsize: 20.0,
            node_penwidth: 2.0,
            edge_penwidth: 2.0,
            cluster_margin: 45.0,
            nodesep: 0.0,
            overlap: "vpsc".to_string(),
            scale: 72.0,
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    row_height: Option<f32>,
    center_x: Option<f32>,
    branch_spacing: Option<f32>,
    side_branch_offset: Option<f32>,
    loop_outer_margin: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    special_shape_width: Option<f32>,
    start_end_height: Option<f32>,
    width_factor: Option<usize>,
    function_gap: Option<f32>,
    edge_arrows: Option<ArrowHead>,
    loopback_arrows: Option<ArrowHead>,
    edge_weight: Option<u32>,
    loop_edge_weight: Option<u32>,
    output_prefix: Option<String>,
    input_prefix: Option<String>,
    title_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    mode: Option<RenderMode>,
    online_mode: Option<bool>,
    engine: Option<String>,
    online_url: Option<String>,
    node_fontsize: Option<f32>,
    edge_fontsize: Option<f32>,
    cluster_fontsize: Option<f32>,
    node_penwidth: Option<f32>,
    edge_penwidth: Option<f32>,
    cluster_margin: Option<f32>,
    nodesep: Option<f32>,
    overlap: Option<String>,
    scale: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON config; JSON5 (comments, trailing commas) is accepted as a
/// fallback.
pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|json5_err| Error::Config(format!("{json_err}; as JSON5: {json5_err}")))?,
    };

    let mut config = Config::default();
    match parsed.theme.as_deref() {
        None | Some("classic") | Some("default") => {}
        Some("modern") => config.theme = Theme::modern(),
        Some(other) => return Err(Error::Config(format!("unknown theme `{other}`"))),
    }
    if let Some(layout) = parsed.layout {
        apply_layout(&mut config.layout, layout);
    }
    if let Some(render) = parsed.render {
        apply_render(&mut config.render, render);
    }
    validate(&config)?;
    Ok(config)
}

fn apply_layout(config: &mut LayoutConfig, file: LayoutConfigFile) {
    if let Some(v) = file.row_height {
        config.row_height = v;
    }
    if let Some(v) = file.center_x {
        config.center_x = v;
    }
    if let Some(v) = file.branch_spacing {
        config.branch_spacing = v;
    }
    if let Some(v) = file.side_branch_offset {
        config.side_branch_offset = v;
    }
    if let Some(v) = file.loop_outer_margin {
        config.loop_outer_margin = v;
    }
    if let Some(v) = file.node_width {
        config.node_width = v;
    }
    if let Some(v) = file.node_height {
        config.node_height = v;
    }
    if let Some(v) = file.special_shape_width {
        config.special_shape_width = v;
    }
    if let Some(v) = file.start_end_height {
        config.start_end_height = v;
    }
    if let Some(v) = file.width_factor {
        config.width_factor = v;
    }
    if let Some(v) = file.function_gap {
        config.function_gap = v;
    }
    if let Some(v) = file.edge_arrows {
        config.edge_arrows = v;
    }
    if let Some(v) = file.loopback_arrows {
        config.loopback_arrows = v;
    }
    if let Some(v) = file.edge_weight {
        config.edge_weight = v;
    }
    if let Some(v) = file.loop_edge_weight {
        config.loop_edge_weight = v;
    }
    if let Some(v) = file.output_prefix {
        config.output_prefix = v;
    }
    if let Some(v) = file.input_prefix {
        config.input_prefix = v;
    }
    if let Some(v) = file.title_prefix {
        config.title_prefix = v;
    }
}

fn apply_render(config: &mut RenderConfig, file: RenderConfigFile) {
    // `onlineMode` is the older boolean switch; an explicit `mode` wins.
    if let Some(true) = file.online_mode {
        config.mode = RenderMode::Online;
    }
    if let Some(v) = file.mode {
        config.mode = v;
    }
    if let Some(v) = file.engine {
        config.engine = v;
    }
    if let Some(v) = file.online_url {
        config.online_url = v;
    }
    if let Some(v) = file.node_fontsize {
        config.node_fontsize = v;
    }
    if let Some(v) = file.edge_fontsize {
        config.edge_fontsize = v;
    }
    if let Some(v) = file.cluster_fontsize {
        config.cluster_fontsize = v;
    }
    if let Some(v) = file.node_penwidth {
        config.node_penwidth = v;
    }
    if let Some(v) = file.edge_penwidth {
        config.edge_penwidth = v;
    }
    if let Some(v) = file.cluster_margin {
        config.cluster_margin = v;
    }
    if let Some(v) = file.nodesep {
        config.nodesep = v;
    }
    if let Some(v) = file.overlap {
        config.overlap = v;
    }
    if let Some(v) = file.scale {
        config.scale = v;
    }
    if let Some(v) = file.width {
        config.width = v;
    }
    if let Some(v) = file.height {
        config.height = v;
    }
}

fn validate(config: &Config) -> Result<()> {
    let layout = &config.layout;
    if !(layout.row_height > 0.0) {
        return Err(Error::Config("rowHeight must be positive".to_string()));
    }
    if !(layout.branch_spacing > 0.0) {
        return Err(Error::Config("branchSpacing must be positive".to_string()));
    }
    if layout.width_factor == 0 {
        return Err(Error::Config("widthFactor must be at least 1".to_string()));
    }
    if !(config.render.scale > 0.0) {
        return Err(Error::Config("scale must be positive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_settings() {
        let config = Config::default();
        assert_eq!(config.layout.branch_spacing, 3.0);
        assert_eq!(config.layout.width_factor, 16);
        assert_eq!(config.render.engine, "fdp");
        assert_eq!(config.render.mode, RenderMode::Native);
    }

    #[test]
    fn parses_partial_json() {
        let config = parse_config(
            r#"{ "theme": "modern", "layout": { "branchSpacing": 4, "loopbackArrows": "normal" },
                 "render": { "onlineMode": true, "nodeFontsize": 12 } }"#,
        )
        .unwrap();
        assert_eq!(config.layout.branch_spacing, 4.0);
        assert_eq!(config.layout.loopback_arrows, ArrowHead::Normal);
        assert_eq!(config.layout.row_height, 1.5);
        assert_eq!(config.render.mode, RenderMode::Online);
        assert_eq!(config.render.node_fontsize, 12.0);
        assert_eq!(config.theme.background, Theme::modern().background);
    }

    #[test]
    fn accepts_json5() {
        let config = parse_config("{ layout: { widthFactor: 20, }, // wider labels\n }").unwrap();
        assert_eq!(config.layout.width_factor, 20);
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let err = parse_config(r#"{ "layout": { "branchSpacing": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
    }
}
