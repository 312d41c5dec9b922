//! Reference CLI harness for the frame orchestrator.
//!
//! Grounded in `natanalt-zenit`'s `clap::Parser`-derived argument struct; the
//! teacher itself is a library with no CLI surface, so this binary is the
//! minimal driver the spec's external interfaces section calls for (spec
//! §6).

use std::sync::Arc;

use clap::Parser;
use myth_orchestrator::orchestrator::{ModuleRecord, PhaseSet, Priority, Surface};
use myth_orchestrator::{LogSink, Orchestrator, OrchestratorConfig, SimulatedGraphicsFacade, ThreadPool};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drives the async frame orchestrator for a fixed number of frames.")]
struct Args {
    /// Number of frames to run before exiting.
    #[arg(short = 'f', long, default_value_t = 120)]
    frames: u64,

    /// Target frames per second; 0 disables pacing.
    #[arg(short = 'r', long, default_value_t = 60)]
    fps: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = OrchestratorConfig::default().with_target_fps(args.fps);
    let thread_pool = match ThreadPool::new(None) {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("failed to start thread pool: {err}");
            std::process::exit(1);
        }
    };

    let graphics: Arc<dyn myth_orchestrator::GraphicsFacade> =
        Arc::new(SimulatedGraphicsFacade::new(config.safety_delay, config.reclaim_soft_threshold));
    let surfaces = vec![Surface::new("main")];

    let mut orchestrator = Orchestrator::new(config, graphics, thread_pool.clone_handle(), Box::new(LogSink), surfaces);

    if let Err(err) = orchestrator.register_module(ModuleRecord::new(
        "heartbeat",
        Priority::NORMAL,
        PhaseSet::GAMEPLAY,
    )) {
        eprintln!("failed to register module: {err}");
        std::process::exit(1);
    }

    let exit_code = thread_pool.block_on(async move {
        if let Err(err) = orchestrator.initialize().await {
            eprintln!("initialize failed: {err}");
            return 1;
        }

        let result = orchestrator.run(Some(args.frames)).await;
        orchestrator.shutdown().await;

        match result {
            Ok(()) => {
                let completed = orchestrator.completed().borrow().0;
                println!("ran {} frames, last reclaimed frame: {completed}", args.frames);
                0
            }
            Err(err) => {
                eprintln!("orchestrator run failed: {err}");
                1
            }
        }
    });

    std::process::exit(exit_code);
}
