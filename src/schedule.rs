//! Task plan: which task runs on which core.
//!
//! Core 0 belongs to the device service task alone; USB full-speed
//! timing leaves no room for another compute-bound task there. The
//! report injection and heartbeat tasks share core 1 and both sleep
//! between iterations, so their interleaving is cooperative.
//!
//! All tasks run at the same, lowest priority (thread-mode executors).
//!
//! Core 0 runs on the main stack. The core 1 stack is sized from the
//! budgets of the tasks pinned there.

use crate::config;

/// Processor core a task is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Core {
    Core0,
    Core1,
}

/// How a task gives up its core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pacing {
    /// Runs back-to-back, yielding only to its own executor.
    Continuous,
    /// Sleeps for the given number of milliseconds between iterations.
    Periodic { period_ms: u64 },
}

/// Creation parameters for one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskConfig {
    pub name: &'static str,
    pub core: Core,
    /// Lower is less urgent; all tasks currently share the lowest level.
    pub priority: u8,
    /// Stack budget in bytes.
    pub stack_bytes: usize,
    pub pacing: Pacing,
}

impl TaskConfig {
    /// Sleep between iterations; zero for continuous tasks.
    pub const fn sleep_ms(&self) -> u64 {
        match self.pacing {
            Pacing::Continuous => 0,
            Pacing::Periodic { period_ms } => period_ms,
        }
    }
}

pub const LOWEST_PRIORITY: u8 = 1;

pub const DEVICE_SERVICE: TaskConfig = TaskConfig {
    name: "device_service",
    core: Core::Core0,
    priority: LOWEST_PRIORITY,
    stack_bytes: 8192,
    pacing: Pacing::Continuous,
};

pub const REPORT_INJECTION: TaskConfig = TaskConfig {
    name: "report_injection",
    core: Core::Core1,
    priority: LOWEST_PRIORITY,
    stack_bytes: 4096,
    pacing: Pacing::Periodic {
        period_ms: config::REPORT_INTERVAL_MS,
    },
};

pub const HEARTBEAT: TaskConfig = TaskConfig {
    name: "heartbeat",
    core: Core::Core1,
    priority: LOWEST_PRIORITY,
    stack_bytes: 1024,
    pacing: Pacing::Periodic {
        period_ms: config::HEARTBEAT_HALF_PERIOD_MS,
    },
};

/// Every task the firmware starts.
pub const TASK_PLAN: [TaskConfig; 3] = [DEVICE_SERVICE, REPORT_INJECTION, HEARTBEAT];

/// Stack handed to core 1 at startup.
pub const CORE1_STACK_BYTES: usize = core_stack_bytes(&TASK_PLAN, Core::Core1);

/// Sum of the stack budgets of the tasks pinned to `core`.
pub const fn core_stack_bytes(plan: &[TaskConfig], core: Core) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < plan.len() {
        if plan[i].core as u8 == core as u8 {
            total += plan[i].stack_bytes;
        }
        i += 1;
    }
    total
}

/// Why a task plan is unacceptable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// A continuous task shares its core with another task.
    SharedContinuousCore(&'static str),
    /// A periodic task never sleeps.
    ZeroPeriod(&'static str),
    /// Two tasks carry the same name.
    DuplicateName(&'static str),
    /// A task has no stack budget, or one that breaks 8-byte alignment.
    BadStack(&'static str),
}

/// Check the plan's timing contract.
pub fn validate_plan(plan: &[TaskConfig]) -> Result<(), PlanError> {
    for (i, task) in plan.iter().enumerate() {
        if plan[..i].iter().any(|t| t.name == task.name) {
            return Err(PlanError::DuplicateName(task.name));
        }
        if task.stack_bytes == 0 || task.stack_bytes % 8 != 0 {
            return Err(PlanError::BadStack(task.name));
        }
        match task.pacing {
            Pacing::Continuous => {
                let neighbours = plan.iter().filter(|t| t.core == task.core).count() - 1;
                if neighbours > 0 {
                    return Err(PlanError::SharedContinuousCore(task.name));
                }
            }
            Pacing::Periodic { period_ms: 0 } => return Err(PlanError::ZeroPeriod(task.name)),
            Pacing::Periodic { .. } => {}
        }
    }
    Ok(())
}

/// Tasks pinned to `core`.
pub fn tasks_on(plan: &[TaskConfig], core: Core) -> impl Iterator<Item = &TaskConfig> {
    plan.iter().filter(move |t| t.core == core)
}
