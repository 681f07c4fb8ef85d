use std::error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;

use crate::bounds::VolumeBounds;
use crate::field::ScalarField;
use crate::mesh::{self, Mesh, Slab};
use crate::ply::{self, PlyDestination, PlyError};

/// Progress of an [`AsyncRunner`] as seen by its host.
///
/// [`AsyncRunner`]: struct.AsyncRunner.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    /// The sweep is still running. `slabs` have been published so far.
    Building { slabs: usize },
    /// The mesh is complete and being written out.
    Writing,
    /// The run is over, successfully or not. [`AsyncRunner::wait`] returns
    /// the result.
    ///
    /// [`AsyncRunner::wait`]: struct.AsyncRunner.html#method.wait
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerError {
    /// A background thread went away without reporting its result.
    WorkerDisconnected,
    Write(PlyError),
}

impl error::Error for RunnerError {}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunnerError::WorkerDisconnected => {
                write!(f, "A background worker stopped before finishing its work.")
            }
            RunnerError::Write(err) => write!(f, "Failed to write the mesh: {}", err),
        }
    }
}

impl From<PlyError> for RunnerError {
    fn from(err: PlyError) -> Self {
        RunnerError::Write(err)
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub slab_count: usize,
    pub triangle_count: usize,
    pub path: PathBuf,
    pub sweep_duration: Duration,
    pub write_duration: Duration,
}

enum BuildEvent {
    Slab(Slab),
    Finished { elapsed: Duration },
}

struct WriteOutcome {
    result: Result<PathBuf, PlyError>,
    elapsed: Duration,
}

/// Runs the marching cubes sweep and the subsequent PLY export in background
/// threads, publishing the mesh slab by slab to the host.
///
/// The host is expected to call [`poll`] regularly (e.g. once per frame).
/// Only `poll` mutates the published mesh, so everything returned by
/// [`mesh`] is made of whole slabs. Once the sweep finishes, the mesh is
/// frozen and shared with the writer thread.
///
/// Dropping the runner completes the run first: it publishes the remaining
/// slabs, writes the file and waits for both threads to finish.
///
/// [`poll`]: #method.poll
/// [`mesh`]: #method.mesh
pub struct AsyncRunner {
    destination: PlyDestination,
    mesh: Arc<Mesh>,
    slab_count: usize,
    sweep_duration: Duration,
    build_thread: Option<thread::JoinHandle<()>>,
    event_receiver: channel::Receiver<BuildEvent>,
    write_thread: Option<thread::JoinHandle<()>>,
    write_receiver: Option<channel::Receiver<WriteOutcome>>,
    outcome: Option<Result<RunSummary, RunnerError>>,
}

impl AsyncRunner {
    /// Starts sweeping `field` on a background thread.
    pub fn spawn<F>(
        field: F,
        isovalue: f32,
        bounds: VolumeBounds,
        destination: PlyDestination,
    ) -> Self
    where
        F: ScalarField + Send + 'static,
    {
        let (event_sender, event_receiver) = channel::unbounded();

        let build_thread = thread::spawn(move || {
            log::info!("Mesh builder starting up");
            let start = Instant::now();

            let slab_count = mesh::sweep(&field, isovalue, &bounds, |slab| {
                event_sender
                    .send(BuildEvent::Slab(slab))
                    .expect("Mesh builder failed to send slab");
            });

            let elapsed = start.elapsed();
            log::info!(
                "Mesh builder finished {} slabs in {:.3}s",
                slab_count,
                elapsed.as_secs_f32(),
            );

            event_sender
                .send(BuildEvent::Finished { elapsed })
                .expect("Mesh builder failed to send completion");
        });

        AsyncRunner {
            destination,
            mesh: Arc::new(Mesh::with_capacity(bounds.estimated_float_capacity())),
            slab_count: 0,
            sweep_duration: Duration::default(),
            build_thread: Some(build_thread),
            event_receiver,
            write_thread: None,
            write_receiver: None,
            outcome: None,
        }
    }

    /// Publishes all slabs that arrived since the last call and advances the
    /// run. Never blocks.
    pub fn poll(&mut self) -> RunnerStatus {
        self.advance(false);
        self.status()
    }

    /// The mesh as published so far.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Blocks until the mesh has been built and written out.
    pub fn wait(&mut self) -> Result<RunSummary, RunnerError> {
        while self.outcome.is_none() {
            self.advance(true);
        }

        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => Err(RunnerError::WorkerDisconnected),
        }
    }

    fn status(&self) -> RunnerStatus {
        if self.outcome.is_some() {
            RunnerStatus::Finished
        } else if self.write_receiver.is_some() {
            RunnerStatus::Writing
        } else {
            RunnerStatus::Building {
                slabs: self.slab_count,
            }
        }
    }

    fn advance(&mut self, blocking: bool) {
        if self.outcome.is_some() {
            return;
        }

        if self.write_receiver.is_none() {
            loop {
                match receive(&self.event_receiver, blocking) {
                    Ok(BuildEvent::Slab(slab)) => self.publish(&slab),
                    Ok(BuildEvent::Finished { elapsed }) => {
                        self.sweep_duration = elapsed;
                        self.start_writing();
                        break;
                    }
                    Err(channel::TryRecvError::Empty) => return,
                    Err(channel::TryRecvError::Disconnected) => {
                        log::error!("Mesh builder disconnected before finishing");
                        self.outcome = Some(Err(RunnerError::WorkerDisconnected));
                        return;
                    }
                }
            }
        }

        if let Some(write_receiver) = &self.write_receiver {
            match receive(write_receiver, blocking) {
                Ok(write_outcome) => self.finish(write_outcome),
                Err(channel::TryRecvError::Empty) => {}
                Err(channel::TryRecvError::Disconnected) => {
                    log::error!("PLY writer disconnected before finishing");
                    self.outcome = Some(Err(RunnerError::WorkerDisconnected));
                }
            }
        }
    }

    fn publish(&mut self, slab: &Slab) {
        // Sole owner until the writer starts, so this never clones.
        Arc::make_mut(&mut self.mesh).append_slab(slab);
        self.slab_count += 1;

        log::trace!(
            "Published slab {}, mesh now has {} vertices",
            slab.index,
            self.mesh.vertex_count(),
        );
    }

    fn start_writing(&mut self) {
        let (write_sender, write_receiver) = channel::bounded(1);
        let mesh = Arc::clone(&self.mesh);
        let destination = self.destination.clone();

        let write_thread = thread::spawn(move || {
            let start = Instant::now();
            let result = ply::write_ply_file(&destination, &mesh);

            write_sender
                .send(WriteOutcome {
                    result,
                    elapsed: start.elapsed(),
                })
                .expect("PLY writer failed to send result");
        });

        self.write_thread = Some(write_thread);
        self.write_receiver = Some(write_receiver);
    }

    fn finish(&mut self, write_outcome: WriteOutcome) {
        let outcome = match write_outcome.result {
            Ok(path) => Ok(RunSummary {
                slab_count: self.slab_count,
                triangle_count: self.mesh.triangle_count(),
                path,
                sweep_duration: self.sweep_duration,
                write_duration: write_outcome.elapsed,
            }),
            Err(err) => {
                log::error!("Failed to write PLY file: {}", err);
                Err(RunnerError::from(err))
            }
        };

        self.outcome = Some(outcome);
    }
}

impl Drop for AsyncRunner {
    fn drop(&mut self) {
        // Runs the pipeline to completion, so a finished sweep still gets
        // written out.
        while self.outcome.is_none() {
            self.advance(true);
        }

        if let Some(thread) = self.build_thread.take() {
            log::debug!("Waiting for mesh builder to shut down");
            if thread.join().is_err() {
                log::error!("Mesh builder thread panicked before joining");
            }
        }

        if let Some(thread) = self.write_thread.take() {
            log::debug!("Waiting for PLY writer to shut down");
            if thread.join().is_err() {
                log::error!("PLY writer thread panicked before joining");
            }
        }
    }
}

fn receive<T>(
    receiver: &channel::Receiver<T>,
    blocking: bool,
) -> Result<T, channel::TryRecvError> {
    if blocking {
        receiver
            .recv()
            .map_err(|_| channel::TryRecvError::Disconnected)
    } else {
        receiver.try_recv()
    }
}
