//! The cropping session: owns the loaded image and the current selection,
//! and turns normalized pointer events into crop rectangles.
//!
//! The session knows nothing about the window toolkit. The UI feeds it the
//! canvas size and pointer events, paints whatever [`CropSession::overlays`]
//! returns, and calls [`CropSession::commit_crop`] on the commit key.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info};

use crate::error::{CropError, Result};
use crate::geometry::{CanvasPoint, CanvasRect, DisplayGeometry, Projection};
use crate::region::{self, CropRectangle};

/// Prefix of every file written by [`CropSession::commit_crop`].
pub const OUTPUT_PREFIX: &str = "cropped_image_";

/// How pointer input selects a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CropMode {
    #[default]
    Unselected,
    /// A square of the configured size centered on each click.
    FixedSizeClick,
    /// A rectangle dragged out between press and release.
    FreehandDrag,
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CropMode::Unselected => "Select Mode",
            CropMode::FixedSizeClick => "click crop",
            CropMode::FreehandDrag => "draw crop",
        };
        write!(f, "{}", s)
    }
}

/// Primary-button pointer events, already in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    /// Pointer moved with no button held.
    Move,
    Press,
    /// Pointer moved with the button held.
    Drag,
    Release,
}

/// How an overlay rectangle should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayStyle {
    /// Fixed-size rectangle following the pointer.
    HoverPreview,
    /// Rectangle of a drag still in progress.
    DragPreview,
    /// Selected rectangle waiting for commit.
    Pending,
    /// Pending rectangle that has been written to disk.
    Saved,
}

/// A rectangle to draw on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay {
    pub rect: CanvasRect,
    pub style: OverlayStyle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        start: CanvasPoint,
        current: CanvasPoint,
    },
}

#[derive(Clone, Copy, Debug)]
struct PendingCrop {
    rect: CropRectangle,
    saved: bool,
}

impl PendingCrop {
    fn new(rect: CropRectangle) -> Self {
        Self { rect, saved: false }
    }
}

/// Interactive crop state for one window.
pub struct CropSession {
    image: Option<DynamicImage>,
    canvas_size: (f32, f32),
    destination: Option<PathBuf>,
    mode: CropMode,
    crop_size: Option<u32>,
    pending: Option<PendingCrop>,
    hover: Option<CropRectangle>,
    drag: DragState,
}

impl Default for CropSession {
    fn default() -> Self {
        Self {
            image: None,
            canvas_size: (0.0, 0.0),
            destination: None,
            mode: CropMode::Unselected,
            crop_size: None,
            pending: None,
            hover: None,
            drag: DragState::Idle,
        }
    }
}

impl CropSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `path` and make it the current image.
    ///
    /// On failure the previous image and selection are left untouched.
    pub fn load_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| CropError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Loaded image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.set_image(image);
        Ok(())
    }

    /// Replace the current image, dropping the old one and any selection.
    pub fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
        self.clear_selection();
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// Record the size of the drawing area. Called every frame by the UI.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.canvas_size = (width, height);
    }

    /// Current geometry, or `None` without an image.
    pub fn geometry(&self) -> Option<DisplayGeometry> {
        let image = self.image.as_ref()?;
        Some(DisplayGeometry::new(
            self.canvas_size.0,
            self.canvas_size.1,
            image.width(),
            image.height(),
        ))
    }

    /// Current projection, or `None` when nothing can be displayed.
    pub fn projection(&self) -> Option<Projection> {
        self.geometry()?.projection()
    }

    /// Use `path` as the save folder.
    ///
    /// The folder must exist and accept new files. This is checked by
    /// creating and removing a scratch file, since permission bits alone do
    /// not say whether the current user can write there.
    pub fn set_save_destination(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if !path.is_dir() || !accepts_new_files(&path) {
            return Err(CropError::InvalidDestination { path });
        }

        info!("Save folder selected: {}", path.display());
        self.destination = Some(path);
        Ok(())
    }

    pub fn save_destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Switch crop mode, discarding the selection made in the old mode.
    ///
    /// Any mode other than `Unselected` needs a save destination; without
    /// one the mode falls back to `Unselected`.
    pub fn set_crop_mode(&mut self, mode: CropMode) -> Result<()> {
        if mode != CropMode::Unselected && self.destination.is_none() {
            self.mode = CropMode::Unselected;
            self.clear_selection();
            return Err(CropError::DestinationRequired);
        }

        if mode != self.mode {
            debug!("Crop mode {} -> {}", self.mode, mode);
            self.clear_selection();
            self.mode = mode;
        }
        Ok(())
    }

    pub fn mode(&self) -> CropMode {
        self.mode
    }

    /// Parse and store the fixed-size crop size, in image pixels.
    pub fn set_crop_size(&mut self, input: &str) -> Result<u32> {
        if self.destination.is_none() {
            return Err(CropError::DestinationRequired);
        }
        let size = region::parse_crop_size(input)?;
        info!("Crop size set to: {}", size);
        self.crop_size = Some(size);
        Ok(size)
    }

    pub fn crop_size(&self) -> Option<u32> {
        self.crop_size
    }

    /// The rectangle `commit_crop` would save.
    pub fn pending(&self) -> Option<CropRectangle> {
        self.pending.map(|p| p.rect)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Route a pointer event to the active mode.
    ///
    /// Does nothing while no image is displayed. The only error is pressing
    /// in click mode before a crop size was set.
    pub fn handle_pointer_event(&mut self, kind: PointerKind, point: CanvasPoint) -> Result<()> {
        let (Some(projection), Some(geometry)) = (self.projection(), self.geometry()) else {
            return Ok(());
        };
        let (width, height) = (geometry.image_width, geometry.image_height);

        match (self.mode, kind) {
            (CropMode::FixedSizeClick, PointerKind::Move) => {
                self.hover = self
                    .crop_size
                    .and_then(|size| region::fixed_size_click(point, size, &projection, width, height));
            }
            (CropMode::FixedSizeClick, PointerKind::Press) => {
                let size = self.crop_size.ok_or(CropError::CropSizeUnset)?;
                self.pending = region::fixed_size_click(point, size, &projection, width, height)
                    .map(PendingCrop::new);
                debug!("Click selection: {:?}", self.pending());
            }
            (CropMode::FreehandDrag, PointerKind::Press) => {
                self.pending = None;
                self.drag = DragState::Dragging {
                    start: point,
                    current: point,
                };
            }
            (CropMode::FreehandDrag, PointerKind::Drag) => {
                if let DragState::Dragging { current, .. } = &mut self.drag {
                    *current = point;
                }
            }
            (CropMode::FreehandDrag, PointerKind::Release) => {
                if let DragState::Dragging { start, .. } = self.drag {
                    self.drag = DragState::Idle;
                    self.pending = region::freehand_drag(start, point, &projection, width, height)
                        .map(PendingCrop::new);
                    debug!("Drag selection: {:?}", self.pending());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Crop the image to the pending rectangle and write it as the next
    /// free `cropped_image_{n}.png` in the save destination.
    pub fn commit_crop(&mut self) -> Result<PathBuf> {
        let (Some(image), Some(dir), Some(pending)) = (&self.image, &self.destination, self.pending)
        else {
            return Err(CropError::NothingToCrop);
        };
        let rect = pending.rect;

        let cropped = image.crop_imm(rect.left(), rect.top(), rect.width(), rect.height());
        let path = next_output_path(dir);
        cropped
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| CropError::ImageSave {
                path: path.clone(),
                source,
            })?;

        info!("Cropped image saved as {}", path.display());
        if let Some(pending) = self.pending.as_mut() {
            pending.saved = true;
        }
        Ok(path)
    }

    /// Rectangles to draw this frame, converted to canvas coordinates.
    pub fn overlays(&self) -> Vec<Overlay> {
        let (Some(projection), Some(geometry)) = (self.projection(), self.geometry()) else {
            return Vec::new();
        };
        let mut overlays = Vec::new();
        let mut push = |rect: CropRectangle, style| {
            overlays.push(Overlay {
                rect: rect.to_canvas(&projection),
                style,
            })
        };

        if let Some(rect) = self.hover.filter(|_| self.mode == CropMode::FixedSizeClick) {
            push(rect, OverlayStyle::HoverPreview);
        }
        if let DragState::Dragging { start, current } = self.drag {
            let preview = region::freehand_drag(
                start,
                current,
                &projection,
                geometry.image_width,
                geometry.image_height,
            );
            if let Some(rect) = preview {
                push(rect, OverlayStyle::DragPreview);
            }
        }
        if let Some(pending) = self.pending {
            let style = if pending.saved {
                OverlayStyle::Saved
            } else {
                OverlayStyle::Pending
            };
            push(pending.rect, style);
        }
        overlays
    }

    fn clear_selection(&mut self) {
        self.pending = None;
        self.hover = None;
        self.drag = DragState::Idle;
    }
}

fn accepts_new_files(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".image_cropper_")
        .tempfile_in(dir)
        .is_ok()
}

/// First `cropped_image_{n}.png` (n >= 1) that does not exist in `dir`.
///
/// Only checks the directory at call time; concurrent writers can race.
pub fn next_output_path(dir: &Path) -> PathBuf {
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{OUTPUT_PREFIX}{n}.png"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn session_with_image(width: u32, height: u32) -> CropSession {
        let mut session = CropSession::new();
        session.set_image(DynamicImage::ImageRgb8(RgbImage::new(width, height)));
        session.set_canvas_size(width as f32, height as f32);
        session
    }

    fn with_destination(mut session: CropSession) -> (CropSession, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        session.set_save_destination(dir.path()).unwrap();
        (session, dir)
    }

    fn pt(x: f32, y: f32) -> CanvasPoint {
        CanvasPoint::new(x, y)
    }

    #[test]
    fn test_mode_requires_destination() {
        let mut session = session_with_image(100, 100);
        let err = session.set_crop_mode(CropMode::FreehandDrag).unwrap_err();
        assert!(matches!(err, CropError::DestinationRequired));
        assert_eq!(session.mode(), CropMode::Unselected);
        assert!(session.set_crop_mode(CropMode::Unselected).is_ok());
    }

    #[test]
    fn test_crop_size_requires_destination() {
        let mut session = session_with_image(100, 100);
        assert!(matches!(
            session.set_crop_size("20"),
            Err(CropError::DestinationRequired)
        ));
        assert_eq!(session.crop_size(), None);
    }

    #[test]
    fn test_crop_size_validation() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        assert!(matches!(
            session.set_crop_size("0"),
            Err(CropError::InvalidSize { .. })
        ));
        assert!(matches!(
            session.set_crop_size("big"),
            Err(CropError::InvalidSize { .. })
        ));
        assert_eq!(session.set_crop_size("30").unwrap(), 30);
        assert_eq!(session.crop_size(), Some(30));
    }

    #[test]
    fn test_click_without_size_is_reported() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FixedSizeClick).unwrap();
        assert!(matches!(
            session.handle_pointer_event(PointerKind::Press, pt(50.0, 50.0)),
            Err(CropError::CropSizeUnset)
        ));
        // Hovering without a size is just silent
        assert!(session.handle_pointer_event(PointerKind::Move, pt(50.0, 50.0)).is_ok());
        assert!(session.overlays().is_empty());
    }

    #[test]
    fn test_click_replaces_pending() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FixedSizeClick).unwrap();
        session.set_crop_size("10").unwrap();

        session.handle_pointer_event(PointerKind::Press, pt(20.0, 20.0)).unwrap();
        assert_eq!(session.pending(), CropRectangle::new(15, 15, 25, 25));
        session.handle_pointer_event(PointerKind::Press, pt(60.0, 70.0)).unwrap();
        assert_eq!(session.pending(), CropRectangle::new(55, 65, 65, 75));
    }

    #[test]
    fn test_hover_preview_does_not_commit() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FixedSizeClick).unwrap();
        session.set_crop_size("10").unwrap();

        session.handle_pointer_event(PointerKind::Move, pt(50.0, 50.0)).unwrap();
        assert_eq!(session.pending(), None);
        let overlays = session.overlays();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].style, OverlayStyle::HoverPreview);
        assert_eq!(overlays[0].rect.min, pt(45.0, 45.0));
    }

    #[test]
    fn test_drag_state_machine() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();

        session.handle_pointer_event(PointerKind::Press, pt(80.0, 10.0)).unwrap();
        assert!(session.is_dragging());
        session.handle_pointer_event(PointerKind::Drag, pt(40.0, 30.0)).unwrap();
        assert_eq!(session.pending(), None);
        let overlays = session.overlays();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].style, OverlayStyle::DragPreview);

        session.handle_pointer_event(PointerKind::Release, pt(20.0, 60.0)).unwrap();
        assert!(!session.is_dragging());
        assert_eq!(session.pending(), CropRectangle::new(20, 10, 80, 60));
        assert_eq!(session.overlays()[0].style, OverlayStyle::Pending);
    }

    #[test]
    fn test_press_clears_previous_drag_selection() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 10.0)).unwrap();
        session.handle_pointer_event(PointerKind::Release, pt(50.0, 50.0)).unwrap();
        assert!(session.pending().is_some());

        session.handle_pointer_event(PointerKind::Press, pt(60.0, 60.0)).unwrap();
        assert_eq!(session.pending(), None);
        // Zero-area release leaves nothing selected
        session.handle_pointer_event(PointerKind::Release, pt(60.0, 90.0)).unwrap();
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn test_mode_switch_cancels_drag() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 10.0)).unwrap();
        session.handle_pointer_event(PointerKind::Drag, pt(50.0, 50.0)).unwrap();

        session.set_crop_mode(CropMode::FixedSizeClick).unwrap();
        assert!(!session.is_dragging());
        assert!(session.overlays().is_empty());
        // A stray release from the old drag is ignored
        session.handle_pointer_event(PointerKind::Release, pt(50.0, 50.0)).unwrap();
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn test_mode_switch_clears_pending() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FixedSizeClick).unwrap();
        session.set_crop_size("10").unwrap();
        session.handle_pointer_event(PointerKind::Press, pt(50.0, 50.0)).unwrap();
        assert!(session.pending().is_some());

        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn test_events_ignored_without_display() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CropSession::new();
        session.set_save_destination(dir.path()).unwrap();
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.set_canvas_size(100.0, 100.0);
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 10.0)).unwrap();
        assert!(!session.is_dragging());

        // Image present but canvas collapsed
        let mut session = session_with_image(100, 100);
        session.set_save_destination(dir.path()).unwrap();
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.set_canvas_size(0.0, 0.0);
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 10.0)).unwrap();
        assert!(!session.is_dragging());
        assert!(session.overlays().is_empty());
    }

    #[test]
    fn test_set_image_clears_selection() {
        let (mut session, _dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 10.0)).unwrap();
        session.handle_pointer_event(PointerKind::Release, pt(50.0, 50.0)).unwrap();

        session.set_image(DynamicImage::ImageRgb8(RgbImage::new(40, 40)));
        assert_eq!(session.pending(), None);
        assert!(matches!(
            session.commit_crop(),
            Err(CropError::NothingToCrop)
        ));
    }

    #[test]
    fn test_commit_marks_saved() {
        let (mut session, dir) = with_destination(session_with_image(100, 100));
        session.set_crop_mode(CropMode::FreehandDrag).unwrap();
        session.handle_pointer_event(PointerKind::Press, pt(10.0, 20.0)).unwrap();
        session.handle_pointer_event(PointerKind::Release, pt(40.0, 35.0)).unwrap();

        let path = session.commit_crop().unwrap();
        assert_eq!(path, dir.path().join("cropped_image_1.png"));
        assert_eq!(session.overlays()[0].style, OverlayStyle::Saved);

        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (30, 15));
    }

    #[test]
    fn test_next_output_path_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_output_path(dir.path()), dir.path().join("cropped_image_1.png"));

        std::fs::write(dir.path().join("cropped_image_1.png"), b"").unwrap();
        std::fs::write(dir.path().join("cropped_image_3.png"), b"").unwrap();
        assert_eq!(next_output_path(dir.path()), dir.path().join("cropped_image_2.png"));
    }

    #[test]
    fn test_invalid_destination() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        let mut session = CropSession::new();
        assert!(matches!(
            session.set_save_destination(&file),
            Err(CropError::InvalidDestination { .. })
        ));
        assert!(matches!(
            session.set_save_destination(dir.path().join("missing")),
            Err(CropError::InvalidDestination { .. })
        ));
        assert_eq!(session.save_destination(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_destination_follows_actual_access() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores mode bits, so ask the filesystem what this user may do
        let can_write = std::fs::write(locked.join("check"), b"").is_ok();
        let _ = std::fs::remove_file(locked.join("check"));

        let mut session = CropSession::new();
        let result = session.set_save_destination(&locked);
        if can_write {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(CropError::InvalidDestination { .. })));
            assert_eq!(session.save_destination(), None);
        }
        // The access check leaves nothing behind
        assert_eq!(std::fs::read_dir(&locked).unwrap().count(), 0);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_destination_check_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CropSession::new();
        session.set_save_destination(dir.path()).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(session.save_destination(), Some(dir.path()));
    }
}
