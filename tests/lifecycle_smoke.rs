use fluid_particles_engine::simulation::{PARTICLE_POSITION, PARTICLE_VELOCITY};
use fluid_particles_engine::systems::gpu::{CommandQueue, GpuCommand};
use fluid_particles_engine::{
    FluidCore, FluidSolver, LifecycleState, ParticleLayout, QualityPreset, SimulationConfig,
};

#[derive(Default)]
struct CountingSolver {
    particles: usize,
    steps: u32,
}

impl FluidSolver for CountingSolver {
    fn reset(&mut self, layout: &ParticleLayout<'_>) {
        self.particles = layout.positions.len() / 3;
    }

    fn step(&mut self, _time_step: f32) {
        self.steps += 1;
    }

    fn discard(&mut self) {
        self.particles = 0;
    }
}

#[test]
fn lifecycle_smoke_through_every_preset() {
    let mut core = FluidCore::new(CountingSolver::default(), CommandQueue::new());

    for _ in 0..3 {
        core.start_simulation().expect("preset scenes should start");
        let plan = core.plan().expect("plan while simulating").clone();
        assert_eq!(core.solver().particles, plan.particle_count as usize);
        assert_eq!(plan.allocations.iter().sum::<u32>(), plan.particle_count);

        for _ in 0..10 {
            core.tick(1000.0 / 60.0);
        }
        core.stop_simulation();
        assert_eq!(core.state(), LifecycleState::Editing);
        assert_eq!(core.solver().particles, 0);

        core.load_next_preset();
    }

    assert_eq!(core.run_count(), 3);
    assert_eq!(core.solver().steps, 30);
    // Same ids every run, so only one run's worth of records is live.
    assert_eq!(core.ledger().live_count(), 6);
    assert_eq!(core.ledger().memory_usage(), core.ledger().accounted_bytes());
}

#[test]
fn replaced_resources_are_deleted_on_the_device() {
    let mut core = FluidCore::new(CountingSolver::default(), CommandQueue::new());
    core.start_simulation().unwrap();
    let old = core.ledger().handle(PARTICLE_POSITION).unwrap();
    core.device_mut().clear();

    core.restart_in_place().unwrap();
    let commands = core.device().commands();
    assert!(commands.contains(&GpuCommand::DeleteTexture { texture: old }));
    let new = core.ledger().handle(PARTICLE_POSITION).unwrap();
    assert_ne!(old, new);
    assert!(core.ledger().handle(PARTICLE_VELOCITY).is_some());
}

#[test]
fn sustained_load_walks_quality_down_to_the_floor() {
    let config = SimulationConfig::default().with_preset(QualityPreset::Medium);
    let mut core = FluidCore::with_config(config, CountingSolver::default(), CommandQueue::new()).unwrap();
    core.start_simulation().unwrap();
    let full = core.plan().unwrap().particle_count;

    for _ in 0..2000 {
        core.tick(100.0);
    }
    let quality = core.quality().quality_level();
    assert!((quality - 0.3).abs() < 1e-9);
    assert!(core.plan().unwrap().particle_count < full);
    assert!(core.restart_count() > 0);
    assert_eq!(core.state(), LifecycleState::Simulating);
}
