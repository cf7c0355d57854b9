/// Window and drawing settings for the cropper UI.
///
/// There is no config file; these are the built-in defaults, adjustable
/// with the builder-style setters before the window is created.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Window title
    pub title: String,

    /// Initial inner window size in logical pixels
    pub initial_size: [f32; 2],

    /// Smallest inner window size the user can resize to
    pub min_size: [f32; 2],

    /// File extensions offered by the open dialog
    pub image_extensions: Vec<String>,

    /// Stroke width of the dashed hover rectangle in click mode
    pub preview_stroke_width: f32,

    /// Stroke width of drag previews and selected rectangles
    pub selection_stroke_width: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "IMAGE-CROPPER".to_string(),
            initial_size: [800.0, 600.0],
            min_size: [400.0, 300.0],
            image_extensions: ["jpg", "jpeg", "png", "bmp", "gif"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            preview_stroke_width: 3.0,
            selection_stroke_width: 2.0,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn set_initial_size(mut self, width: f32, height: f32) -> Self {
        self.initial_size = [width, height];
        self
    }

    pub fn set_min_size(mut self, width: f32, height: f32) -> Self {
        self.min_size = [width, height];
        self
    }

    pub fn set_image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the hover preview and selection stroke widths.
    pub fn set_stroke_widths(mut self, preview: f32, selection: f32) -> Self {
        self.preview_stroke_width = preview;
        self.selection_stroke_width = selection;
        self
    }

    /// Whether `path` has one of the accepted image extensions.
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}
