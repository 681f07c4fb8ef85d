use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;

use isosurface_mesher::config::{self, RunParameters};
use isosurface_mesher::field::FieldKind;
use isosurface_mesher::logger;
use isosurface_mesher::runner::{AsyncRunner, RunnerStatus};

const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Extracts an isosurface of a scalar field with marching cubes and writes it
/// as an ASCII PLY file.
#[derive(Debug, Parser)]
#[clap(name = "isosurface_mesher")]
struct Options {
    /// RON file with run parameters. Other options override its values.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Edge length of a single cell.
    #[clap(long)]
    step: Option<f32>,
    /// Lower bound of the swept volume on all axes.
    #[clap(long, allow_hyphen_values = true)]
    min: Option<f32>,
    /// Upper bound of the swept volume on all axes.
    #[clap(long, allow_hyphen_values = true)]
    max: Option<f32>,
    #[clap(long, allow_hyphen_values = true)]
    isovalue: Option<f32>,
    /// Field to extract the surface of.
    #[clap(long, value_enum, conflicts_with = "function")]
    field: Option<FieldKind>,
    /// Field to extract the surface of, by number (1-8). Unknown numbers
    /// select the sphere.
    #[clap(long)]
    function: Option<u32>,
    #[clap(long)]
    output_dir: Option<PathBuf>,
    #[clap(long)]
    file_name: Option<String>,
}

impl Options {
    fn run_parameters(&self) -> Result<RunParameters, config::ConfigError> {
        let mut parameters = match &self.config {
            Some(path) => config::open(path)?,
            None => RunParameters::default(),
        };

        if let Some(step) = self.step {
            parameters.step_size = step;
        }
        if let Some(min) = self.min {
            parameters.min = min;
        }
        if let Some(max) = self.max {
            parameters.max = max;
        }
        if let Some(isovalue) = self.isovalue {
            parameters.isovalue = isovalue;
        }
        if let Some(field) = self.field {
            parameters.field = field;
        }
        if let Some(selector) = self.function {
            parameters.field = FieldKind::from_selector(selector);
        }
        if let Some(output_dir) = &self.output_dir {
            parameters.output_directory = output_dir.clone();
        }
        if let Some(file_name) = &self.file_name {
            parameters.file_name = file_name.clone();
        }

        Ok(parameters)
    }
}

fn main() {
    let options = Options::parse();

    if let Err(err) = logger::init() {
        eprintln!("Failed to initialize logger: {}", err);
    }

    if let Err(err) = run(&options) {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let parameters = options.run_parameters()?;
    let bounds = parameters.volume_bounds()?;

    log::info!(
        "Extracting {} (function {}) at isovalue {} from {:?} to {:?} with step {}",
        parameters.field,
        parameters.field.selector(),
        parameters.isovalue,
        bounds.minimum_point(),
        bounds.maximum_point(),
        bounds.step_size(),
    );

    let mut runner = AsyncRunner::spawn(
        parameters.field,
        parameters.isovalue,
        bounds,
        parameters.destination(),
    );

    let mut visible_vertices = 0;
    let mut writing = false;
    loop {
        match runner.poll() {
            RunnerStatus::Building { .. } => {}
            RunnerStatus::Writing if !writing => {
                log::info!("Mesh complete, writing it out");
                writing = true;
            }
            RunnerStatus::Writing => {}
            RunnerStatus::Finished => break,
        }

        let vertex_count = runner.mesh().vertex_count();
        if vertex_count != visible_vertices {
            log::debug!("Visible vertices: {}", vertex_count);
            visible_vertices = vertex_count;
        }

        thread::sleep(FRAME_DURATION);
    }

    let summary = runner.wait()?;
    log::info!(
        "Wrote {} triangles from {} slabs to {} (sweep {:.3}s, write {:.3}s)",
        summary.triangle_count,
        summary.slab_count,
        summary.path.display(),
        summary.sweep_duration.as_secs_f32(),
        summary.write_duration.as_secs_f32(),
    );

    Ok(())
}
