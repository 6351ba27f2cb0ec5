use sph_fluid::statistics::SimulationStatistics;
use sph_fluid::{
    PassPipeline, PointerTracker, Scalar, Simulation, SphParameters, SphSimulation, StepDriver,
    Vec2, Vertex,
};

use std::path::{Path, PathBuf};
use std::str::FromStr;

use eyre::WrapErr;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug)]
enum Solver {
    Cpu,
    Pipeline,
}

impl FromStr for Solver {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Solver::Cpu),
            "pipeline" => Ok(Solver::Pipeline),
            _ => Err(eyre::eyre!("unknown solver {:?}, expected `cpu` or `pipeline`", s)),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "sph_fluid", about = "Runs a 2d SPH fluid without a window")]
struct Opt {
    /// JSON file with the simulation parameters
    #[structopt(short, long)]
    config: Option<PathBuf>,
    /// Every frame is written here as `000.dat`, `001.dat`, ... (MessagePack vertices)
    #[structopt(short, long)]
    output_dir: Option<PathBuf>,
    #[structopt(short, long, default_value = "600")]
    frames: usize,
    /// `cpu` or `pipeline`
    #[structopt(short, long, default_value = "cpu")]
    solver: Solver,
    /// Some solvers round this up
    #[structopt(short, long, default_value = "200")]
    particles: usize,
    #[structopt(long, default_value = "1200")]
    width: Scalar,
    #[structopt(long, default_value = "1200")]
    height: Scalar,
    /// Drag the pointer around in a circle
    #[structopt(long)]
    stir: bool,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_parameters(opt: &Opt) -> eyre::Result<SphParameters> {
    let params = match &opt.config {
        Some(path) => std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read JSON settings file: {:?}", path))
            .and_then(|json| {
                serde_json::from_slice(&json).wrap_err("Serde failed to deserialize JSON.")
            })?,
        None => match opt.solver {
            Solver::Cpu => SphParameters::default(),
            Solver::Pipeline => SphParameters::dense_pipeline(),
        },
    };
    params.validate()?;
    Ok(params)
}

/// Where the pointer is during `frame` when stirring.
fn stir_position(view_size: Vec2, frame: usize) -> Vec2 {
    let angle = frame as Scalar / 240. * std::f64::consts::TAU;
    let radius = view_size.x.min(view_size.y) / 4.;
    view_size / 2. + Vec2::new(angle.cos(), angle.sin()) * radius
}

fn run<S>(opt: &Opt, params: SphParameters) -> eyre::Result<()>
where
    S: Simulation + SimulationStatistics,
{
    let view_size = Vec2::new(opt.width, opt.height);
    let simulation = S::initialize(params, opt.particles, view_size)?;
    info!(
        particles = simulation.num_particles(),
        bounds = ?simulation.space().bounds,
        "initialized {:?} solver",
        opt.solver
    );

    if let Some(dir) = &opt.output_dir {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let mut driver = StepDriver::new(simulation);
    let mut pointer = PointerTracker::new();
    if opt.stir {
        pointer.pointer_down(stir_position(view_size, 0));
    }

    for frame in 0..opt.frames {
        if opt.stir {
            pointer.pointer_move(stir_position(view_size, frame));
        }
        let impulse = pointer.update();

        let time = (frame + 1) as Scalar * sph_fluid::driver::TARGET_FRAME_DURATION;
        driver.frame(time, impulse);

        let simulation = driver.simulation();
        if frame % 60 == 0 {
            info!(
                frame,
                time = simulation.total_time(),
                energy = simulation.total_energy(),
                momentum = ?simulation.total_linear_momentum(),
                "simulated frame"
            );
        }

        if let Some(dir) = &opt.output_dir {
            write_frame(dir, frame, simulation.vertices())?;
        }
    }

    Ok(())
}

fn write_frame(dir: &Path, frame: usize, vertices: Vec<Vertex>) -> eyre::Result<()> {
    let path = dir.join(format!("{:03}.dat", frame));
    let mut writer = std::fs::File::create(&path)
        .wrap_err_with(|| format!("Failed to create frame file: {:?}", path))?;
    rmp_serde::encode::write(&mut writer, &vertices)?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    setup_logging();
    let opt = Opt::from_args();
    let params = load_parameters(&opt)?;

    match opt.solver {
        Solver::Cpu => run::<SphSimulation>(&opt, params),
        Solver::Pipeline => run::<PassPipeline>(&opt, params),
    }
}
