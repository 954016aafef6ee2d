use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use orelight::{
    BlockEsp, CaveEsp, EspController, EspCore, Event, EventQueue, LogMessages, OreEsp, Settings,
    UserMessages,
};
use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_highlight::LineSegment;
use orelight_runtime::{Runtime, RuntimeConfig};
use orelight_sim::parse_seed;
use orelight_world::{
    Block, BiomeSource, BlockTable, ClimateBiomes, FixedBiome, GridWorld, TerrainGen,
    TerrainParams, WorldView,
};

/// Ticks between the first change notification and the reload.
const SETTINGS_SETTLE_TICKS: u64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Block,
    Cave,
    Ore,
}

#[derive(Parser)]
#[command(
    name = "orelight",
    about = "Run a highlight overlay headless over a generated demo world"
)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Which overlay to run
    #[arg(long, value_enum, default_value_t = Mode::Block)]
    mode: Mode,
    /// World seed; overrides `ore_esp.seed`
    #[arg(long, allow_hyphen_values = true)]
    seed: Option<String>,
    /// View distance in chunks; overrides `view_distance`
    #[arg(long)]
    radius: Option<i32>,
    /// Number of simulated ticks
    #[arg(long, default_value_t = 200)]
    ticks: u64,
    /// Reload settings when the config file changes
    #[arg(long)]
    watch: bool,
}

fn spawn_settings_watcher(path: PathBuf) -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};
        if let Ok(mut watcher) =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            })
        {
            if let Err(e) = watcher.watch(path.as_path(), RecursiveMode::NonRecursive) {
                log::warn!("cannot watch {}: {}", path.display(), e);
                return;
            }
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
    });
    rx
}

/// Generates every missing chunk around `center` and reports the new ones.
fn stream_chunks(
    world: &GridWorld,
    terrain: &TerrainGen,
    center: ChunkPos,
    radius: i32,
    queue: &mut EventQueue,
) {
    for pos in center.range_closed(radius) {
        if world.is_loaded(pos) {
            continue;
        }
        world.insert_chunk(terrain.generate(pos, world.min_y(), world.height()));
        queue.emit_now(Event::ChunkLoaded { pos });
    }
    for pos in world.loaded_chunks() {
        if pos.chebyshev(center) > radius + 1 {
            world.remove_chunk(pos);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = &cli.seed {
        settings.ore_esp.seed = seed.clone();
    }
    if let Some(r) = cli.radius {
        settings.view_distance = r.max(0);
    }

    let world_seed = parse_seed(&settings.ore_esp.seed).unwrap_or(0);
    let world = Arc::new(GridWorld::overworld(BlockTable::builtin()));
    let terrain = TerrainGen::new(world_seed as i32, TerrainParams::default(), world.blocks());
    let biomes: Arc<dyn BiomeSource> = match ClimateBiomes::overworld(world_seed as i32) {
        Ok(b) => Arc::new(b),
        Err(e) => {
            log::warn!("biome table unavailable ({}); using plains everywhere", e);
            Arc::new(FixedBiome::new("plains"))
        }
    };
    let runtime = Arc::new(Runtime::new(RuntimeConfig::default())?);
    let messages: Arc<dyn UserMessages> = Arc::new(LogMessages);

    let mut queue = EventQueue::new();
    let mut player = ChunkPos::new(0, 0);
    stream_chunks(&world, &terrain, player, settings.view_distance, &mut queue);
    // the initial area is picked up by on_enable
    while queue.pop_ready().is_some() {}

    let world_view: Arc<dyn WorldView> = world.clone();
    let mut controller: Box<dyn EspController> = match cli.mode {
        Mode::Block => {
            let core = EspCore::new("block-esp", runtime.clone(), world_view, messages);
            Box::new(BlockEsp::new(core, &settings))
        }
        Mode::Cave => {
            let core = EspCore::new("cave-esp", runtime.clone(), world_view, messages);
            Box::new(CaveEsp::new(core, &settings))
        }
        Mode::Ore => {
            let core = EspCore::new("ore-esp", runtime.clone(), world_view, messages);
            Box::new(OreEsp::new(core, &settings, biomes))
        }
    };
    controller.on_enable()?;

    let settings_rx = match (&cli.config, cli.watch) {
        (Some(path), true) => Some(spawn_settings_watcher(path.clone())),
        _ => None,
    };

    let mut lines: Vec<LineSegment> = Vec::new();
    for tick in 0..cli.ticks {
        // walk east half a block per tick
        let camera = Vec3::new(8.0 + tick as f32 * 0.5, 80.0, 8.0);
        queue.emit_now(Event::PlayerMoved { camera });

        let here = ChunkPos::containing(camera.x.floor() as i32, camera.z.floor() as i32);
        if here != player {
            player = here;
            stream_chunks(&world, &terrain, player, settings.view_distance, &mut queue);
        }

        if tick % 10 == 5 {
            let (x, z) = (camera.x.floor() as i32, 8);
            if let Some(top) = world.surface_height(x, z) {
                let pos = BlockPos::new(x, top - 2, z);
                if let Some(old) = world.set_block(pos, Block::AIR) {
                    queue.emit_now(Event::BlockChanged {
                        pos,
                        old,
                        new: Block::AIR,
                    });
                }
            }
        }

        // editors write a file in several steps; reload once it settles
        if settings_rx.as_ref().is_some_and(|rx| rx.try_iter().count() > 0)
            && !queue.is_scheduled(&Event::SettingsChanged)
        {
            queue.emit_after(SETTINGS_SETTLE_TICKS, Event::SettingsChanged);
        }
        queue.emit_now(Event::WorldRenderTick { player });

        while let Some(env) = queue.pop_ready() {
            if env.kind == Event::SettingsChanged {
                let Some(path) = &cli.config else { continue };
                match Settings::from_path(path) {
                    Ok(new_settings) => {
                        settings = new_settings;
                        log::info!("settings reloaded from {}", path.display());
                        if let Err(e) = controller.apply_settings(&settings) {
                            log::error!("overlay stopped after reload: {}", e);
                        }
                    }
                    Err(e) => log::warn!("ignoring bad settings file: {}", e),
                }
                continue;
            }
            controller.handle(&env.kind);
        }

        lines.clear();
        controller.render(camera, &mut lines);
        controller.core().pump_reports();

        if tick % 50 == 0 {
            let stats = controller.core().cache.stats();
            let (qe, ie, qb, ib) = runtime.queue_debug_counts();
            log::info!(
                "tick {}: {} chunks / {} blocks cached, {} lines, queues edit {}+{} bg {}+{}",
                tick,
                stats.chunks,
                stats.blocks,
                lines.len(),
                qe,
                ie,
                qb,
                ib
            );
        }
        queue.advance_tick();
        thread::sleep(Duration::from_millis(5));
    }

    if !controller.core().flush(Duration::from_secs(10)) {
        log::warn!("background work still queued at exit");
    }
    let stats = controller.core().cache.stats();
    log::info!(
        "done: {} commits, {} block updates, {} evictions, {} chunks / {} blocks cached",
        stats.commits,
        stats.block_updates,
        stats.evictions,
        stats.chunks,
        stats.blocks
    );
    controller.on_disable();
    Ok(())
}
