use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use itertools::Itertools;

use modelview::orientation::ModelRotation;
use modelview::{Frame, ModelLoader, ModelSource, SessionSnapshot, ViewMode, ViewerConfig, Viewport};

#[derive(Parser, Debug)]
#[command(name = "modelview")]
#[command(about = "Load OBJ, STL, GLTF and GLB models and describe how they would be displayed", long_about = None)]
struct Cli {
    /// Display mode: faces, edges or vertices
    #[arg(long, default_value_t = ViewMode::Faces)]
    mode: ViewMode,

    /// Do not draw the translucent surface behind edges and vertices
    #[arg(long)]
    no_context: bool,

    /// Largest extent of the model in the main viewport
    #[arg(long, default_value_t = 3.0)]
    target_size: f32,

    /// Largest extent of the model in the preview viewport
    #[arg(long, default_value_t = 1.8)]
    preview_size: f32,

    /// Model files to load, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            interactive_size: self.target_size,
            preview_size: self.preview_size,
            view_mode: self.mode,
            show_context: !self.no_context,
        }
    }
}

fn print_frame(label: &str, frame: &Frame, snapshot: &SessionSnapshot) {
    println!(
        "  {}: scale {:.4}, position [{:.4}, {:.4}, {:.4}]",
        label,
        frame.transform.scale,
        frame.transform.position.x,
        frame.transform.position.y,
        frame.transform.position.z
    );

    let Some(model) = &snapshot.model else {
        return;
    };

    for drawable in &frame.drawables {
        let mesh_name = drawable
            .mesh(&model.scene)
            .map(|mesh| mesh.name.as_str())
            .unwrap_or("?");
        println!(
            "    {:?} {} #{:06x}",
            drawable.style,
            mesh_name,
            drawable.color.to_hex()
        );
    }
}

fn print_snapshot(snapshot: &SessionSnapshot, config: &ViewerConfig, rotation: &ModelRotation) {
    let Some(model) = &snapshot.model else {
        return;
    };

    println!("  format: {}", model.format);
    println!(
        "  {} meshes, {} vertices, {} faces",
        snapshot.stats.mesh_count, snapshot.stats.vertex_count, snapshot.stats.face_count
    );

    let orientation = rotation.to_quat(snapshot.format);

    let interactive = Viewport::interactive(config).frame(Some(model), orientation);
    print_frame(&format!("{} view", config.view_mode), &interactive, snapshot);

    let preview = Viewport::reference_preview(config).frame(Some(model), orientation);
    print_frame("preview", &preview, snapshot);

    let style_counts = interactive
        .drawables
        .iter()
        .counts_by(|drawable| format!("{:?}", drawable.style));
    println!(
        "  drawables: {}",
        style_counts
            .iter()
            .sorted()
            .map(|(style, count)| format!("{} x{}", style, count))
            .join(", ")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = cli.viewer_config();
    let loader = ModelLoader::new(config.clone());
    let mut rotation = ModelRotation::default();
    let mut failures = 0;

    for path in &cli.files {
        println!("{}", path.display());

        let source = match ModelSource::from_path(path) {
            Ok(source) => source,
            Err(error) => {
                println!("  error: {:#}", error);
                failures += 1;
                continue;
            }
        };

        rotation.reset();
        loader.select(source).await?;

        let snapshot = loader.snapshot();
        match &snapshot.error {
            Some(error) => {
                println!("  error: {}", error);
                failures += 1;
            }
            None => print_snapshot(&snapshot, &config, &rotation),
        }
    }

    if failures > 0 {
        bail!("{} of {} files failed to load", failures, cli.files.len());
    }

    Ok(())
}
