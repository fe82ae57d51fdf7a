//! Image export: capture the canonical-size scene and hand out PNG bytes.

use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{CalShotError, CalShotResult};
use crate::interaction::GridGeometry;
use crate::month::Month;
use crate::raster::{PIXEL_RATIO, Snapshot, snapshot};
use crate::scene::{Scene, display_scale};

/// Where the canonical copy of the calendar currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Hidden, outside the visible viewport
    Offscreen,
    /// Raised on top of everything for a capture
    Onscreen,
}

/// The calendar as presented: a scaled visible copy plus the canonical copy
/// that exports read from.
#[derive(Debug, Clone)]
pub struct Surface {
    export: Scene,
    visible_scale: f32,
    placement: Placement,
}

impl Surface {
    pub fn new(scene: Scene, viewport_width: u32) -> Self {
        Surface {
            export: scene,
            visible_scale: display_scale(viewport_width),
            placement: Placement::Offscreen,
        }
    }

    /// Replace the scene after a store or settings change.
    pub fn update(&mut self, scene: Scene) {
        self.export = scene;
    }

    pub fn set_viewport(&mut self, viewport_width: u32) {
        self.visible_scale = display_scale(viewport_width);
    }

    pub fn scene(&self) -> &Scene {
        &self.export
    }

    pub fn visible_scale(&self) -> f32 {
        self.visible_scale
    }

    /// Size of the visible copy in display units.
    pub fn visible_size(&self) -> (f32, f32) {
        (
            self.export.width as f32 * self.visible_scale,
            self.export.height as f32 * self.visible_scale,
        )
    }

    /// Hit-test geometry of the visible copy.
    pub fn geometry(&self) -> GridGeometry {
        self.export.geometry(self.visible_scale)
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Raise the canonical copy until the returned guard is dropped.
    pub fn capture(&mut self) -> CaptureGuard<'_> {
        self.placement = Placement::Onscreen;
        CaptureGuard { surface: self }
    }
}

/// Keeps the canonical copy on screen; puts it back on drop.
pub struct CaptureGuard<'a> {
    surface: &'a mut Surface,
}

impl Deref for CaptureGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &self.surface.export
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.surface.placement = Placement::Offscreen;
    }
}

/// Destination for copied images.
pub trait Clipboard {
    fn write_png(&self, png_data: &[u8]) -> CalShotResult<()>;
}

/// `calendar-2024-06.png`
pub fn export_file_name(month: Month) -> String {
    format!("calendar-{}.png", month.slug())
}

/// Runs captures one at a time.
#[derive(Debug)]
pub struct Exporter {
    in_flight: Mutex<()>,
    pixel_ratio: u32,
}

impl Default for Exporter {
    fn default() -> Self {
        Exporter::new(PIXEL_RATIO)
    }
}

impl Exporter {
    pub fn new(pixel_ratio: u32) -> Self {
        Exporter {
            in_flight: Mutex::new(()),
            pixel_ratio,
        }
    }

    /// Capture the canonical scene and encode it as PNG.
    pub async fn render(&self, surface: &mut Surface) -> CalShotResult<Snapshot> {
        let _busy = self.in_flight.lock().await;
        let capture = surface.capture();
        let scene = Scene::clone(&capture);
        let pixel_ratio = self.pixel_ratio;

        let result = tokio::task::spawn_blocking(move || snapshot(&scene, pixel_ratio))
            .await
            .map_err(|e| CalShotError::Export(format!("capture task failed: {e}")))
            .and_then(|r| r);
        drop(capture);

        if let Err(e) = &result {
            error!(error = %e, "capture failed");
        }
        result
    }

    /// Save the capture as `calendar-<yyyy>-<MM>.png` in `dir`.
    pub async fn download(&self, surface: &mut Surface, month: Month, dir: &Path) -> CalShotResult<PathBuf> {
        let Snapshot { width, height, png_data } = self.render(surface).await?;
        let path = dir.join(export_file_name(month));
        let dir = dir.to_path_buf();
        let target = path.clone();

        let written = tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &png_data))
            .await
            .map_err(|e| CalShotError::Export(format!("write task failed: {e}")))
            .and_then(|r| r);

        match written {
            Ok(()) => {
                info!(path = %path.display(), width, height, "exported");
                Ok(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "export failed");
                Err(e)
            }
        }
    }

    /// Put the capture on `clipboard`.
    pub async fn copy(&self, surface: &mut Surface, clipboard: &dyn Clipboard) -> CalShotResult<Snapshot> {
        let snapshot = self.render(surface).await?;
        if let Err(e) = clipboard.write_png(&snapshot.png_data) {
            error!(error = %e, "clipboard write failed");
            return Err(e);
        }
        info!(bytes = snapshot.png_data.len(), "copied to clipboard");
        Ok(snapshot)
    }
}

fn write_atomic(dir: &Path, target: &Path, data: &[u8]) -> CalShotResult<()> {
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(target)
        .map_err(|e| CalShotError::Export(format!("could not save {}: {}", target.display(), e.error)))?;
    Ok(())
}
