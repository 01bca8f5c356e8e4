//! Simple ray tracer example.
//!
//! Builds a scene from an inline script, renders it and saves it in PPM
//! format.

use lumo_core::Engine;
use lumo_renderer::{color_to_rgba, render_scene, ImageBuffer, RenderConfig, RenderStrategy};
use std::fs::File;
use std::io::{BufWriter, Write};

const SCENE: &str = r#"
; Three spheres on a checkerboard, the middle one a mirror
(set spacing 2.5)
(scene
  (camera (position 0 2 -8) (direction 0 -0.2 1) (hlen 1.6) (vlen 1.2))
  (light (position 4 8 -4) (color 1 1 1) (power 30))
  (plane (position 0 -1 0) (normal 0 1 0) (mirror 0.3))
  (for (i -1 1)
    (sphere (position (* $i $spacing) 0 3) (radius 1) (color 1 0.3 0.2)))
  (sphere (position 0 0 3) (radius 1.1) (color 0.8 0.8 1) (mirror 0.9)))
"#;

fn main() {
    println!("Lumo Ray Tracer - Simple Example");
    println!("================================");

    let start = std::time::Instant::now();
    let mut engine = Engine::new();
    engine.eval_str(SCENE).expect("Scene script failed");
    let scene = engine.take_scenes().pop().expect("Script defined no scene");
    println!(
        "Scene built in {:?} ({} primitives)",
        start.elapsed(),
        scene.primitive_count()
    );

    let config = RenderConfig::default()
        .with_resolution(800, 600)
        .with_strategy(RenderStrategy::Parallel { workers: 3 });
    println!("Rendering {}x{}...", config.width, config.height);

    let start = std::time::Instant::now();
    let image = render_scene(&scene, config).expect("Render failed");
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.ppm";
    save_ppm(&image, filename).expect("Failed to save image");
    println!("Saved to {}", filename);
}

fn save_ppm(image: &ImageBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for y in 0..image.height {
        for x in 0..image.width {
            let rgba = color_to_rgba(image.get(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    Ok(())
}
