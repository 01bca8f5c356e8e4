//! Render scheduling: runs the tracer over every pixel of a scene.
//!
//! Rows are grouped into strides (see [`crate::stride`]). A render either
//! walks the rows in order, renders one stride per pass for a progressive
//! preview, or hands each stride to its own rayon task. Every pixel depends
//! only on the scene and its coordinates, so all strategies produce the
//! same image.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lumo_core::{Camera, Scene};
use lumo_math::{clamp_unit, Color};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stride::{generate_strides, partition_rows, Row};
use crate::tracer::send_ray;

/// Fill color of pixels that have not been rendered yet.
pub const UNRENDERED: Color = Color::new(1.0, 0.0, 1.0);

/// Worker count used by the default configuration.
pub const DEFAULT_WORKERS: u32 = 3;

/// Errors that stop a render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Scene has no camera")]
    MissingCamera,

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Render cancelled")]
    Cancelled,
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// How rows are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderStrategy {
    /// Row-major scan on the calling thread.
    Sequential,
    /// One pass per stride of `passes` rows, coarse to fine.
    Interlaced { passes: u32 },
    /// `workers` rayon tasks plus the scope's own closure, each owning one
    /// stride of `workers + 1` rows.
    Parallel { workers: u32 },
}

impl Default for RenderStrategy {
    fn default() -> Self {
        RenderStrategy::Parallel {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub strategy: RenderStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            strategy: RenderStrategy::default(),
        }
    }
}

impl RenderConfig {
    /// Set the image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the row scheduling strategy.
    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Progress callbacks. They may be called from any render thread and are
/// only meant to trigger redraws.
pub trait RenderListener: Send + Sync {
    fn on_render_start(&self) {}

    fn on_render_end(&self) {}

    /// Row `y` is finished.
    fn on_render_line(&self, _y: u32) {}
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let c = clamp_unit(color);
    [
        (255.0 * c.x) as u8,
        (255.0 * c.y) as u8,
        (255.0 * c.z) as u8,
        255,
    ]
}

/// Row-major pixel buffer for render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with [`UNRENDERED`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![UNRENDERED; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&color| color_to_rgba(color)).collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Owns the output buffer and renders scenes into it.
pub struct Renderer {
    config: RenderConfig,
    image: ImageBuffer,
    listener: Option<Arc<dyn RenderListener>>,
    cancel: Arc<AtomicBool>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let image = ImageBuffer::new(config.width, config.height);
        Self {
            config,
            image,
            listener: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_listener(&mut self, listener: Arc<dyn RenderListener>) {
        self.listener = Some(listener);
    }

    /// Flag that stops the current render at the next row when set.
    ///
    /// The flag is cleared when a render starts.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Color of pixel (x, y); [`UNRENDERED`] until the render reaches it.
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.image.get(x, y)
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    pub fn into_image(self) -> ImageBuffer {
        self.image
    }

    /// Render `scene` into the buffer, blocking until every row is done.
    pub fn render(&mut self, scene: &Scene) -> RenderResult<()> {
        let RenderConfig {
            width,
            height,
            strategy,
        } = self.config;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution { width, height });
        }
        let camera = scene.camera.as_ref().ok_or(RenderError::MissingCamera)?;
        if scene.light.is_none() {
            log::warn!("Scene has no light, shading is ambient only");
        }

        self.cancel.store(false, Ordering::Relaxed);
        self.image.fill(UNRENDERED);
        if let Some(listener) = &self.listener {
            listener.on_render_start();
        }

        log::info!(
            "Rendering {}x{} ({} primitives, {:?})",
            width,
            height,
            scene.primitive_count(),
            strategy
        );
        let start = Instant::now();

        let pass = Pass {
            scene,
            camera,
            width,
            height,
            listener: self.listener.as_deref(),
            cancel: &self.cancel,
        };
        let pixels = &mut self.image.pixels;
        match strategy {
            RenderStrategy::Sequential => pass.sequential(pixels)?,
            RenderStrategy::Interlaced { passes } => pass.interlaced(pixels, passes)?,
            RenderStrategy::Parallel { workers } => pass.parallel(pixels, workers)?,
        }

        log::info!("Render complete in {:.2?}", start.elapsed());
        if let Some(listener) = &self.listener {
            listener.on_render_end();
        }
        Ok(())
    }
}

/// Render one scene with a given image size.
pub fn render_scene(scene: &Scene, config: RenderConfig) -> RenderResult<ImageBuffer> {
    let mut renderer = Renderer::new(config);
    renderer.render(scene)?;
    Ok(renderer.into_image())
}

/// Shared read-only state of one render.
struct Pass<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    width: u32,
    height: u32,
    listener: Option<&'a dyn RenderListener>,
    cancel: &'a AtomicBool,
}

impl Pass<'_> {
    fn sequential(&self, pixels: &mut [Color]) -> RenderResult<()> {
        let rows = pixels
            .chunks_mut(self.width as usize)
            .enumerate()
            .map(|(y, row)| (y as u32, row));
        self.render_rows(rows)
    }

    fn interlaced(&self, pixels: &mut [Color], passes: u32) -> RenderResult<()> {
        let strides = generate_strides(passes);
        let groups = partition_rows(pixels, self.width, &strides);
        let count = groups.len();

        for (index, group) in groups.into_iter().enumerate() {
            self.render_rows(group)?;
            log::debug!("Pass {}/{} done", index + 1, count);
        }
        Ok(())
    }

    /// Stride 0 is rendered by the scope's own closure, the others by spawned
    /// rayon tasks. The scope returns once all of them have finished.
    fn parallel(&self, pixels: &mut [Color], workers: u32) -> RenderResult<()> {
        let strides = generate_strides(workers.saturating_add(1));
        let mut groups = partition_rows(pixels, self.width, &strides).into_iter();
        let own = groups.next().unwrap_or_default();

        let mut results: Vec<RenderResult<()>> = vec![Ok(()); strides.len()];
        let (own_result, worker_results) = results.split_at_mut(1);

        rayon::scope(|s| {
            for (index, (group, result)) in groups.zip(worker_results.iter_mut()).enumerate() {
                s.spawn(move |_| {
                    *result = self.render_rows(group);
                    log::debug!("Stride {} done", index + 1);
                });
            }
            own_result[0] = self.render_rows(own);
        });

        results.into_iter().collect()
    }

    fn render_rows<'p>(&self, rows: impl IntoIterator<Item = Row<'p>>) -> RenderResult<()> {
        for (y, row) in rows {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(RenderError::Cancelled);
            }
            for (x, pixel) in row.iter_mut().enumerate() {
                let ray = self.camera.ray_for(x as u32, y, self.width, self.height);
                *pixel = clamp_unit(send_ray(self.scene, &ray, 0));
            }
            if let Some(listener) = self.listener {
                listener.on_render_line(y);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use lumo_core::load_scene_from_str;

    const TEST_SCENE: &str = r#"
        (scene
          (camera (position 0 1 -6) (direction 0 -0.1 1))
          (light (position 2 6 -2) (color 1 1 1) (power 30))
          (plane (position 0 -1 0) (normal 0 1 0) (mirror 0.2))
          (sphere (position -1 0 2) (radius 1) (color 1 0.2 0.2) (mirror 0))
          (sphere (position 1.5 0.5 3) (radius 1.2) (color 0.2 0.4 1) (mirror 0.7)))
    "#;

    fn test_scene() -> Scene {
        load_scene_from_str(TEST_SCENE).unwrap()
    }

    fn render_with(strategy: RenderStrategy) -> ImageBuffer {
        let config = RenderConfig::default()
            .with_resolution(32, 24)
            .with_strategy(strategy);
        render_scene(&test_scene(), config).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        starts: AtomicUsize,
        ends: AtomicUsize,
        lines: Mutex<Vec<u32>>,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl RenderListener for Recorder {
        fn on_render_start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_end(&self) {
            self.ends.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_line(&self, y: u32) {
            let mut lines = self.lines.lock().unwrap();
            lines.push(y);
            if let Some((limit, cancel)) = &self.cancel_after {
                if lines.len() >= *limit {
                    cancel.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = RenderConfig::default();
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.strategy, RenderStrategy::Parallel { workers: 3 });
    }

    #[test]
    fn test_strategies_are_pixel_identical() {
        let sequential = render_with(RenderStrategy::Sequential);
        assert!(!sequential.pixels.contains(&UNRENDERED));

        for strategy in [
            RenderStrategy::Interlaced { passes: 4 },
            RenderStrategy::Parallel { workers: 0 },
            RenderStrategy::Parallel { workers: 1 },
            RenderStrategy::Parallel { workers: 3 },
            RenderStrategy::Parallel { workers: 40 },
        ] {
            assert_eq!(render_with(strategy), sequential, "{strategy:?}");
        }
    }

    #[test]
    fn test_pixels_are_clamped() {
        let image = render_with(RenderStrategy::Sequential);
        assert!(image
            .pixels
            .iter()
            .all(|c| c.min_element() >= 0.0 && c.max_element() <= 1.0));
    }

    #[test]
    fn test_missing_camera() {
        let mut scene = test_scene();
        scene.camera = None;
        let mut renderer = Renderer::new(RenderConfig::default().with_resolution(4, 4));
        assert_eq!(renderer.render(&scene), Err(RenderError::MissingCamera));
        assert_eq!(renderer.get_pixel(0, 0), UNRENDERED);
    }

    #[test]
    fn test_invalid_resolution() {
        let mut renderer = Renderer::new(RenderConfig::default().with_resolution(0, 4));
        assert_eq!(
            renderer.render(&test_scene()),
            Err(RenderError::InvalidResolution { width: 0, height: 4 })
        );
    }

    #[test]
    fn test_listener_sees_every_row() {
        let recorder = Arc::new(Recorder::default());
        let mut renderer = Renderer::new(
            RenderConfig::default()
                .with_resolution(8, 10)
                .with_strategy(RenderStrategy::Parallel { workers: 3 }),
        );
        renderer.set_listener(recorder.clone());
        renderer.render(&test_scene()).unwrap();

        let mut lines = recorder.lines.lock().unwrap().clone();
        lines.sort_unstable();
        assert_eq!(lines, (0..10).collect::<Vec<_>>());
        assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interlaced_row_order() {
        let recorder = Arc::new(Recorder::default());
        let mut renderer = Renderer::new(
            RenderConfig::default()
                .with_resolution(4, 5)
                .with_strategy(RenderStrategy::Interlaced { passes: 2 }),
        );
        renderer.set_listener(recorder.clone());
        renderer.render(&test_scene()).unwrap();

        assert_eq!(*recorder.lines.lock().unwrap(), vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn test_cancel_stops_between_rows() {
        let mut renderer = Renderer::new(
            RenderConfig::default()
                .with_resolution(4, 6)
                .with_strategy(RenderStrategy::Sequential),
        );
        let recorder = Arc::new(Recorder {
            cancel_after: Some((2, renderer.cancel_handle())),
            ..Default::default()
        });
        renderer.set_listener(recorder.clone());

        assert_eq!(renderer.render(&test_scene()), Err(RenderError::Cancelled));
        assert_eq!(*recorder.lines.lock().unwrap(), vec![0, 1]);
        assert_eq!(recorder.ends.load(Ordering::SeqCst), 0);
        assert_ne!(renderer.get_pixel(0, 1), UNRENDERED);
        assert_eq!(renderer.get_pixel(0, 2), UNRENDERED);

        // A new render clears the flag
        let recorder = Arc::new(Recorder::default());
        renderer.set_listener(recorder.clone());
        renderer.render(&test_scene()).unwrap();
        assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_color_to_rgba() {
        assert_eq!(color_to_rgba(Color::new(1.0, 0.0, 0.5)), [255, 0, 127, 255]);
        assert_eq!(color_to_rgba(Color::new(2.0, -1.0, 1.0)), [255, 0, 255, 255]);

        let mut image = ImageBuffer::new(2, 1);
        image.set(1, 0, Color::ZERO);
        assert_eq!(image.to_rgba8(), vec![255, 0, 255, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_sample_scenes_render() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes");
        for name in ["spheres.scene", "mirrors.scene", "grid.scene"] {
            let scene = lumo_core::load_scene(dir.join(name)).unwrap();
            let config = RenderConfig::default().with_resolution(16, 12);
            let image = render_scene(&scene, config).unwrap();
            assert!(!image.pixels.contains(&UNRENDERED), "{name}");
        }
    }

    #[test]
    fn test_config_serde() {
        let json = r#"{ "width": 320, "strategy": { "kind": "interlaced", "passes": 8 } }"#;
        let config: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 480);
        assert_eq!(config.strategy, RenderStrategy::Interlaced { passes: 8 });
    }
}
