use crate::systems::gpu::GpuDevice;

use super::lifecycle;
use super::render_context::RenderContext;
use super::{FluidCore, FluidSolver, TickReport};

/// One cooperative frame: quality, optional rebuild, step, draw
pub(super) fn tick<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, frame_time_ms: f64) -> TickReport {
    core.fps.record(frame_time_ms);
    let quality = core.quality.update(frame_time_ms);

    let mut restarted = false;
    if quality.changed() {
        console_log!("quality {:.3} -> {:.3}", quality.previous_level, quality.quality_level);
        if core.is_simulating() && core.config.auto_restart_on_quality_change {
            // A refused rebuild keeps the current run going.
            restarted = lifecycle::restart_in_place(core).is_ok();
        }
    }

    let mut stepped = false;
    if core.is_simulating() {
        core.solver.step(core.config.time_step);
        core.frame += 1;
        stepped = true;

        let mut ctx = RenderContext::new(&mut core.device, &mut core.cache, &core.ledger, core.plan.as_ref());
        core.solver.draw(&mut ctx);
    }

    TickReport { quality, restarted, stepped, state: core.state }
}
