
#[derive(Debug, Clone)]
pub struct Theme {
    pub font_family: String,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub decision_color: String,
    pub io_color: String,
    pub terminator_color: String,
    pub edge_label_background: String,
    pub cluster_background: String,
    pub cluster_border: String,
    pub background: String,
}

impl Theme {
    /// Black-on-white, matching what Graphviz draws for the same description.
    pub fn classic() -> Self {
        Self {
            font_family: "Times New Roman, serif".to_string(),
            primary_color: "#FFFFFF".to_string(),
            primary_text_color: "#000000".to_string(),
            primary_border_color: "#000000".to_string(),
            line_color: "#000000".to_string(),
            decision_color: "#FFFFFF".to_string(),
            io_color: "#FFFFFF".to_string(),
            terminator_color: "#FFFFFF".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            cluster_background: "#FFFFFF".to_string(),
            cluster_border: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            primary_color: "#F8FAFF".to_string(),
            primary_text_color: "#1C2430".to_string(),
            primary_border_color: "#7A8AA6".to_string(),
            line_color: "#7A8AA6".to_string(),
            decision_color: "#FFF8E6".to_string(),
            io_color: "#EEF7EE".to_string(),
            terminator_color: "#EEF2F8".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            cluster_background: "#FCFDFF".to_string(),
            cluster_border: "#D7E0F0".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
