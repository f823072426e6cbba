//! Temporal-property verifier for SVSHI apps.
//!
//! SVSHI apps read and write KNX bus addresses (*GA*s) through device handles, keep a small app
//! state, and may observe the calendar through `svshi_api`. Their invariants can use
//! `svshi_api.check_time_property(frequency, duration, condition)`: *every `frequency`, there is
//! a window of `duration` during which `condition` holds*.
//!
//! This crate checks that one iteration of the system (function `system_behaviour`) preserves
//! each invariant, in three steps.
//!
//! - [`explore`]: functions are executed symbolically, each feasible path yields a path
//!   condition, a returned value, and the final value of every field of the records it receives.
//! - [`compose`]: the paths of the iteration become one post-state function per field,
//!   `If(g_1, v_1, If(g_2, v_2, ..., -1))`.
//! - [`rewrite`], [`encode`] and [`verify`]: temporal predicates of the invariant are replaced by
//!   sentinels before exploration, then by a closed quantified formula over calendar fields once
//!   their condition is known in terms of the post-state. The invariant must then hold for all
//!   values of the remaining free variables, a counterexample is produced otherwise.
//!
//! # Input
//!
//! Apps are given as one module, see [`parse::module`].
//!
//! ```text
//! physical_state { GA_0_0_1: bool, GA_0_0_2: bool }
//! devices {
//!     presence: binary_sensor(GA_0_0_1),
//!     light: switch(GA_0_0_2),
//! }
//!
//! fn light_invariant(
//!     light_app_state: AppState,
//!     physical_state: PhysicalState,
//!     internal_state: InternalState,
//! ) -> bool {
//!     return svshi_api.check_time_property(Day(1), Hour(2), light.is_on(physical_state));
//! }
//!
//! fn system_behaviour(
//!     light_app_state: AppState,
//!     physical_state: PhysicalState,
//!     internal_state: InternalState,
//! ) {
//!     if 18 <= svshi_api.get_hour_of_the_day(internal_state) <= 22 {
//!         light.on(physical_state);
//!     } else {
//!         light.off(physical_state);
//!     }
//! }
//! ```
//!
//! # Solver
//!
//! All queries go through [`rsmt2`] to a `z3` process, see [`conf::Conf`] for the command and
//! the timeouts.

#![forbid(missing_docs)]

pub extern crate rsmt2;

#[macro_use]
mod macros;

pub mod prelude;

pub mod app;
pub mod compose;
pub mod conf;
pub mod date;
pub mod encode;
pub mod err;
pub mod explore;
pub mod expr;
pub mod parse;
pub mod rewrite;
pub mod solver;
pub mod verify;
