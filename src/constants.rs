pub const N: usize = 9;
pub const NN: usize = N * N;

pub const DEFAULT_ITERATIONS: u32 = 50_000;
pub const DEFAULT_TIME_MS: u64 = 1_000;
/// Playouts to run before the clock is consulted, capped so huge
/// iteration budgets still honour the time budget.
pub const TIME_CHECK_FLOOR: u32 = 128;

pub const RAVE_PRIOR_WINS: u32 = 10;
pub const RAVE_PRIOR_VISITS: u32 = 20;
pub const EXPLORATION: f32 = 0.25;
pub const TIE_EPSILON: f32 = 1e-4;
