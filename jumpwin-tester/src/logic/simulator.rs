use std::borrow::Cow;

use jumpwin_core::{
    ActionVector, Actor, Button, ForcedActions, MoveSequence, OracleError, Outcome, Replay,
    ReplayOracle, TerminalFlags,
};
use log::trace;

use super::course::{GateCourse, Hazard};
use super::runners::{agent_plan, human_plan};

/// Deterministic replay oracle for [`GateCourse`] levels.
///
/// Right advances one unit of distance per frame, left walks back one. A gate
/// is cleared by a jump that takes off inside its window and is released
/// within its hold range; passing the window any other way is fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseOracle;

impl ReplayOracle for CourseOracle {
    type Level = GateCourse;

    fn simulate(
        &self,
        course: &GateCourse,
        actor: &Actor,
        render: bool,
    ) -> Result<Replay, OracleError> {
        let forced = match actor {
            Actor::Forced(forced) => Cow::Borrowed(forced),
            Actor::Human => Cow::Owned(ForcedActions::new(human_plan(course))),
            Actor::SearchAgent => Cow::Owned(ForcedActions::new(agent_plan(course))),
        };
        run_course(course, &forced, render)
    }
}

#[derive(Debug, Clone, Copy)]
struct Takeoff {
    tick: usize,
    distance: usize,
}

#[derive(Debug, Default)]
struct RunnerState {
    tick: usize,
    distance: usize,
    next_gate: usize,
    airborne: Option<Takeoff>,
}

impl RunnerState {
    fn step(&mut self, course: &GateCourse, action: &ActionVector) -> Option<TerminalFlags> {
        let right = action.is_pressed(Button::Right);
        let left = action.is_pressed(Button::Left);
        if right && !left {
            self.distance += 1;
        } else if left && !right {
            self.distance = self.distance.saturating_sub(1);
        }

        match (self.airborne, action.is_pressed(Button::Jump)) {
            (None, true) => {
                self.airborne = Some(Takeoff {
                    tick: self.tick,
                    distance: self.distance,
                });
            }
            (Some(takeoff), false) => {
                self.airborne = None;
                self.land(course, takeoff);
            }
            _ => {}
        }
        self.tick += 1;

        if let Some(gate) = course.gates.get(self.next_gate) {
            let in_flight = self.airborne.is_some_and(|takeoff| {
                gate.accepts_start(takeoff.distance) && self.tick - takeoff.tick <= gate.max_hold
            });
            if self.distance > gate.close && !in_flight {
                return Some(match gate.hazard {
                    Hazard::Enemy => TerminalFlags {
                        died_to_enemy: true,
                        ..TerminalFlags::default()
                    },
                    Hazard::Pit => TerminalFlags {
                        died_to_fall: true,
                        ..TerminalFlags::default()
                    },
                });
            }
        }

        (self.next_gate == course.gates.len() && self.distance >= course.length).then(|| {
            TerminalFlags {
                won: true,
                ..TerminalFlags::default()
            }
        })
    }

    fn land(&mut self, course: &GateCourse, takeoff: Takeoff) {
        let hold = self.tick - takeoff.tick;
        if let Some(gate) = course.gates.get(self.next_gate)
            && gate.accepts_start(takeoff.distance)
            && gate.accepts_hold(hold)
        {
            trace!("gate {} cleared with hold {hold}", self.next_gate);
            self.next_gate += 1;
        }
    }
}

fn run_course(
    course: &GateCourse,
    forced: &ForcedActions,
    render: bool,
) -> Result<Replay, OracleError> {
    let mut state = RunnerState::default();
    let mut applied = Vec::new();

    let flags = loop {
        if state.tick >= course.time_limit {
            break TerminalFlags {
                ran_out_of_time: true,
                ..TerminalFlags::default()
            };
        }
        let action = forced
            .action_at(state.tick)
            .cloned()
            .unwrap_or_else(ActionVector::idle);
        let status = state.step(course, &action);
        applied.push(action);
        if render {
            trace!(
                "{} frame {} distance {} gate {}",
                course.name, state.tick, state.distance, state.next_gate
            );
        }
        if let Some(flags) = status {
            break flags;
        }
    };

    let outcome = Outcome::classify(flags)?;
    Ok(Replay::new(outcome, state.tick).with_recording(MoveSequence::new(applied)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::course::{Gate, Tier};
    use jumpwin_core::{can_complete, forward_forced};

    fn one_gate(hazard: Hazard) -> GateCourse {
        GateCourse {
            name: "one gate".to_string(),
            seed: 0,
            tier: Tier::Standard,
            length: 40,
            time_limit: 60,
            gates: vec![Gate {
                open: 10,
                close: 12,
                min_hold: 2,
                max_hold: 4,
                hazard,
            }],
        }
    }

    fn running(len: usize) -> MoveSequence {
        MoveSequence::repeat(&ActionVector::from_buttons(&[Button::Right]), len)
    }

    #[test]
    fn holding_right_on_a_flat_course_wins() {
        let replay = CourseOracle
            .simulate(&GateCourse::flat(10), &Actor::forced(running(10)), false)
            .unwrap();
        assert_eq!(replay.outcome, Outcome::Win);
        assert_eq!(replay.frames, 10);
        assert_eq!(replay.recorded, Some(running(10)));
    }

    #[test]
    fn missing_a_gate_dies_to_its_hazard() {
        let enemy = CourseOracle
            .simulate(&one_gate(Hazard::Enemy), &forward_forced(), false)
            .unwrap();
        assert_eq!(enemy.outcome, Outcome::DiedToEnemy);
        assert_eq!(enemy.frames, 13);

        let pit = CourseOracle
            .simulate(&one_gate(Hazard::Pit), &forward_forced(), false)
            .unwrap();
        assert_eq!(pit.outcome, Outcome::DiedToFall);
    }

    #[test]
    fn gate_needs_start_and_hold_in_range() {
        let course = one_gate(Hazard::Pit);
        // press on frame f takes off at distance f + 1
        for (start, hold, wins) in [
            (9, 2, true),
            (11, 4, true),
            (8, 3, false),
            (12, 3, false),
            (10, 1, false),
            (10, 5, false),
        ] {
            let moves = running(40).with_jump_held(start..start + hold);
            assert_eq!(
                can_complete(&CourseOracle, &course, moves).unwrap(),
                wins,
                "start {start} hold {hold}"
            );
        }
    }

    #[test]
    fn idle_runs_time_out() {
        let idle = MoveSequence::repeat(&ActionVector::idle(), 5);
        let replay = CourseOracle
            .simulate(&GateCourse::flat(10), &Actor::forced(idle), false)
            .unwrap();
        assert_eq!(replay.outcome, Outcome::TimedOut);
        assert_eq!(replay.frames, 20);
    }
}
