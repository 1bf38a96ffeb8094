use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{fmt, EnvFilter};

use plant_generator::config::PlantConfig;
use plant_generator::export;
use plant_generator::presets::PlantPreset;
use plant_generator::random::resolve_seed;
use plant_generator::skeleton::JointKind;
use plant_generator::{generate, generate_batch};

#[derive(Parser, Debug)]
#[command(name = "plant_generator")]
#[command(about = "Generate skinned L-System plant meshes")]
struct Args {
    /// Plant configuration (JSON). Overrides --preset.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in preset: fern, bush, weed, sapling
    #[arg(short, long, default_value = "bush")]
    preset: PlantPreset,

    /// Random seed (0 picks a fresh seed)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    seed: i32,

    /// Override the configured generation count
    #[arg(short, long)]
    generations: Option<u32>,

    /// Print the expanded symbol sequence
    #[arg(long)]
    print_dna: bool,

    /// Write the full plant (joints, seams, mesh) as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Write the mesh as Wavefront OBJ
    #[arg(long)]
    export_obj: Option<PathBuf>,

    /// Write raw vertex/index buffers to <PREFIX>.vtx and <PREFIX>.idx
    #[arg(long)]
    export_buffers: Option<PathBuf>,

    /// Write a PNG silhouette preview
    #[arg(long)]
    export_preview: Option<PathBuf>,

    /// Preview image size in pixels
    #[arg(long, default_value = "512")]
    preview_size: u32,

    /// Save the effective configuration as JSON
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Generate this many plants in parallel (consecutive seeds) and report stats
    #[arg(long)]
    batch: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            println!("Loading config from {}", path.display());
            PlantConfig::load(path)?
        }
        None => {
            println!("Using preset: {} ({})", args.preset, args.preset.description());
            args.preset.config()
        }
    };
    if let Some(generations) = args.generations {
        config.generations = generations;
    }
    for warning in config.validate() {
        println!("Warning: {}", warning);
    }
    if let Some(path) = &args.save_config {
        config.save(path)?;
        println!("Saved config to {}", path.display());
    }

    let mut fallback = ChaCha8Rng::from_entropy();
    let seed = resolve_seed(args.seed, &mut fallback);

    if let Some(count) = args.batch {
        run_batch(&config, seed, count);
        return Ok(());
    }

    println!("Generating plant with seed: {}", seed);
    let Some(plant) = generate(&config, seed)? else {
        println!("Grammar produced no symbols; nothing to render.");
        return Ok(());
    };

    let skeleton = &plant.skeleton;
    println!("DNA length: {} symbols", plant.dna.len());
    println!(
        "Joints: {} ({} branches, {} terminals, {} leaves), max depth {}",
        skeleton.len(),
        skeleton.count(JointKind::Branch),
        skeleton.count(JointKind::Terminal),
        skeleton.count(JointKind::Leaf),
        skeleton.max_depth,
    );
    println!(
        "Mesh: {} vertices, {} triangles",
        plant.mesh.vertex_count(),
        plant.mesh.triangle_count()
    );
    if let Some((lo, hi)) = plant.mesh.bounds() {
        let size = hi - lo;
        println!("Bounds: {:.2} x {:.2} x {:.2}", size.x, size.y, size.z);
    }

    if args.print_dna {
        println!("{}", plant.dna);
    }

    if let Some(path) = &args.export_json {
        println!("Exporting plant JSON to {}", path.display());
        export::export_json(&plant, path)?;
    }
    if let Some(path) = &args.export_obj {
        println!("Exporting OBJ to {}", path.display());
        export::export_obj(&plant.mesh, &format!("plant_{}", seed), path)?;
    }
    if let Some(prefix) = &args.export_buffers {
        let vertex_path = with_suffix(prefix, "vtx");
        let index_path = with_suffix(prefix, "idx");
        println!(
            "Exporting buffers to {} and {}",
            vertex_path.display(),
            index_path.display()
        );
        export::export_buffers(&plant.mesh, &vertex_path, &index_path)?;
    }
    if let Some(path) = &args.export_preview {
        println!("Exporting preview to {}", path.display());
        export::export_preview(
            &plant.mesh,
            &plant.skeleton,
            args.preview_size,
            args.preview_size,
            path,
        )?;
    }

    Ok(())
}

fn with_suffix(prefix: &Path, extension: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

fn run_batch(config: &PlantConfig, first_seed: i32, count: usize) {
    let seeds: Vec<i32> = (0..count as i32)
        .map(|i| first_seed.wrapping_add(i))
        .collect();
    println!("Generating {} plants from seed {}...", count, first_seed);

    let results = generate_batch(config, &seeds);
    let mut built = 0usize;
    let mut joints = 0usize;
    let mut triangles = 0usize;
    let mut empty = 0usize;
    for (seed, result) in seeds.iter().zip(results) {
        match result {
            Ok(Some(plant)) => {
                built += 1;
                joints += plant.skeleton.len();
                triangles += plant.mesh.triangle_count();
            }
            Ok(None) => empty += 1,
            Err(e) => println!("Seed {} failed: {}", seed, e),
        }
    }
    if built > 0 {
        println!(
            "Built {} plants: avg {:.1} joints, avg {:.1} triangles",
            built,
            joints as f64 / built as f64,
            triangles as f64 / built as f64
        );
    }
    if empty > 0 {
        println!("{} plants produced no symbols", empty);
    }
}
