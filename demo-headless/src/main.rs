use clap::Parser;
use forest_fire_core::{
    CellCategory, ChunkCoord, ForestAction, ForestConfig, ForestGrid, ForestSimulation, NoiseParams, Vec3,
};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Forest fire simulation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "forest-fire-demo")]
#[command(about = "Chunked forest fire simulation demo", long_about = None)]
struct Args {
    /// Forest width in chunks
    #[arg(long, default_value_t = 4)]
    width: usize,

    /// Forest height in chunks
    #[arg(long, default_value_t = 3)]
    height: usize,

    /// Cells per chunk side (overrides the config file)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 400)]
    ticks: usize,

    /// Print a stats row every N ticks
    #[arg(short, long, default_value_t = 25)]
    report_interval: usize,

    /// Wind speed
    #[arg(short, long, default_value_t = 0.0)]
    wind_speed: f32,

    /// Wind direction in degrees (direction the wind blows from, 0 = +x)
    #[arg(long, default_value_t = 0.0)]
    wind_direction: f32,

    /// Chance per tick that a growing tree checks for fire (overrides the config file)
    #[arg(long)]
    spread: Option<f32>,

    /// Chance per tick that a burning tree advances (overrides the config file)
    #[arg(long)]
    burn: Option<f32>,

    /// RNG seed (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fixed noise scale; generates a deterministic layout with zero offset
    #[arg(long)]
    noise_scale: Option<f64>,

    /// JSON file with a `ForestConfig`; missing fields take defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignite at world position X,Y instead of random fires
    #[arg(short, long, value_parser = parse_point)]
    ignite: Option<(f32, f32)>,

    /// Print an ASCII map after every report
    #[arg(short, long)]
    map: bool,
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

fn load_config(args: &Args) -> Result<ForestConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let config: ForestConfig = serde_json::from_str(&text)?;
            info!("Loaded config from {}", path.display());
            config
        }
        None => ForestConfig {
            chunk_size: 32,
            ..Default::default()
        },
    };

    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(spread) = args.spread {
        config.fire_spread_speed = spread;
    }
    if let Some(burn) = args.burn {
        config.burn_speed = burn;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn map_glyph(category: Option<CellCategory>) -> char {
    match category {
        None => ' ',
        Some(CellCategory::Alive) => '^',
        Some(CellCategory::Burning) => '*',
        Some(CellCategory::Ash) => '.',
    }
}

/// Print the forest top-down, +y up, sampling cells so the map stays under
/// 120 columns.
fn print_map(grid: &ForestGrid) {
    let (width, height) = grid.dimensions();
    let size = grid.chunk_size();
    let (cells_x, cells_y) = (width * size, height * size);
    let step = cells_x.div_ceil(120).max(1);

    for gy in (0..cells_y).rev().step_by(step) {
        let row: String = (0..cells_x)
            .step_by(step)
            .map(|gx| {
                let coord = ChunkCoord::new((gx / size) as i32, (gy / size) as i32);
                let cell = grid.chunk(coord).and_then(|c| c.cell(gx % size, gy % size));
                map_glyph(cell.and_then(|c| c.category()))
            })
            .collect();
        println!("|{row}|");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let tick_interval = config.tick_interval;

    println!("=== Forest Fire Simulation Demo ===\n");

    let mut sim = ForestSimulation::with_config(args.width, args.height, config)?;
    match args.noise_scale {
        Some(scale) => {
            let noise = NoiseParams {
                scale,
                offset_x: 0.0,
                offset_y: 0.0,
                ..sim.grid().config().noise
            };
            sim.grid_mut().generate_with(noise)?;
        }
        None => sim.grid_mut().generate(),
    }

    let grid = sim.grid();
    let (width, height) = grid.dimensions();
    println!(
        "Forest: {}x{} chunks of {} cells, {} trees",
        width,
        height,
        grid.chunk_size(),
        grid.stats().trees()
    );

    sim.submit(ForestAction::SetWindSpeed(args.wind_speed));
    sim.submit(ForestAction::SetWindDirection(args.wind_direction.to_radians()));
    match args.ignite {
        Some((x, y)) => sim.submit(ForestAction::Ignite(Vec3::new(x, y, 0.0))),
        None => sim.submit(ForestAction::AddRandomFire),
    }
    sim.set_running(true);

    // Apply the queued wind and ignition actions before the first tick
    sim.update(0.0);
    for applied in sim.actions().history() {
        if let Some(e) = &applied.error {
            println!("Action {:?} rejected: {}", applied.action, e);
        }
    }

    let wind = sim.grid().wind();
    println!(
        "Wind: speed {:.1}, from {:.0} deg, spread {:.2}, burn {:.2}\n",
        wind.speed(),
        wind.direction().to_degrees(),
        sim.grid().config().fire_spread_speed,
        sim.grid().config().burn_speed
    );

    println!("   Tick |   Alive | Burning |  Burned");
    println!("--------|---------|---------|--------");
    let report_interval = args.report_interval.max(1);
    let mut peak_burning = 0;
    // Drive the scheduler with exactly one interval per frame
    while (sim.grid().tick_count() as usize) < args.ticks {
        sim.update(tick_interval);
        let stats = sim.grid().stats();
        peak_burning = peak_burning.max(stats.burning);

        let tick = stats.ticks as usize;
        if tick % report_interval == 0 || tick == args.ticks {
            println!("{:7} | {:7} | {:7} | {:7}", tick, stats.alive, stats.burning, stats.burned);
            if args.map {
                print_map(sim.grid());
                println!();
            }
        }
        if stats.burning == 0 && tick > 0 {
            println!("Fire is out after {} ticks", tick);
            break;
        }
    }

    let stats = sim.grid().stats();
    println!("\n=== Simulation Complete ===");
    println!("Ticks run: {}", stats.ticks);
    println!("Peak burning trees: {}", peak_burning);
    println!(
        "Burned: {} of {} trees ({:.1}%)",
        stats.burned,
        stats.trees(),
        100.0 * stats.burned as f32 / stats.trees().max(1) as f32
    );
    if !args.map {
        println!();
        print_map(sim.grid());
    }
    Ok(())
}
