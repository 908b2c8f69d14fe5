//! Routes socket commands into the timing engine.
//!
//! | command  | effect                                       |
//! |----------|----------------------------------------------|
//! | `split`  | start when idle, else split; no-op when done |
//! | `start`  | start when idle                              |
//! | `reset`  | discard the current run                      |
//! | `status` | no change                                    |
//!
//! Every accepted command answers with `{"response":"ok","action":...,"status":{...}}`
//! where `action` names what actually happened (`ignored` for no-ops).

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::engine::{StartOutcome, SplitOutcome, TimingEngine, Transition};
use crate::server::{Command, CommandHandler, command_name, error_response};

#[derive(Debug, Clone)]
pub struct CommandRouter {
    engine: Arc<TimingEngine>,
}

impl CommandRouter {
    pub fn new(engine: Arc<TimingEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<TimingEngine> {
        &self.engine
    }

    pub fn dispatch(&self, command: &Command) -> Value {
        let name = command_name(command);
        debug!("Command {:?}", name);

        let mut extra = json!({});
        let action = match name {
            Some("split") => self.transition(self.engine.advance(), &mut extra),
            Some("start") => self.transition(Transition::Start(self.engine.start()), &mut extra),
            Some("reset") => {
                if self.engine.reset() {
                    "reset"
                } else {
                    "ignored"
                }
            }
            Some("status") => "status",
            _ => return error_response("unknown_command"),
        };

        let mut response = json!({
            "response": "ok",
            "action": action,
            "status": self.engine.status(),
        });
        if let (Some(response), Value::Object(extra)) = (response.as_object_mut(), extra) {
            response.extend(extra);
        }
        response
    }

    fn transition(&self, transition: Transition, extra: &mut Value) -> &'static str {
        match transition {
            Transition::Start(StartOutcome::Started) => "started",
            Transition::Start(StartOutcome::AlreadyRunning) => "ignored",
            Transition::Start(StartOutcome::NoSegments) => "no_segments",
            Transition::Split(SplitOutcome::Ignored) => "ignored",
            Transition::Split(SplitOutcome::Split { index, elapsed }) => {
                *extra = json!({ "split_index": index, "split_time": elapsed });
                "split"
            }
            Transition::Split(SplitOutcome::Finished { total, recorded }) => {
                *extra = json!({
                    "total": total,
                    "run_key": recorded.as_ref().map(|r| r.key.as_str()),
                    "saved": recorded.as_ref().is_some_and(|r| r.persisted),
                });
                "finished"
            }
            Transition::Reset => "reset",
        }
    }
}

impl CommandHandler for CommandRouter {
    fn handle(&self, command: Command) -> Value {
        self.dispatch(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ManualClock;
    use crate::history::HistoryStore;
    use crate::test_utils::names;
    use crate::types::SplitDefinition;

    fn router() -> (CommandRouter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(500.0));
        let definition = SplitDefinition::new("G", "C", names(&["A", "B"])).unwrap();
        let engine =
            TimingEngine::with_clock(definition, HistoryStore::in_memory("G", "C"), clock.clone());
        (CommandRouter::new(Arc::new(engine)), clock)
    }

    fn command(name: &str) -> Command {
        let Value::Object(map) = json!({ "command": name }) else { unreachable!() };
        map
    }

    #[test]
    fn split_drives_a_full_run() {
        let (router, clock) = router();

        let started = router.dispatch(&command("split"));
        assert_eq!(started["response"], "ok");
        assert_eq!(started["action"], "started");
        assert_eq!(started["status"]["current_index"], 0);

        clock.advance(10.0);
        let split = router.dispatch(&command("split"));
        assert_eq!(split["action"], "split");
        assert_eq!(split["split_index"], 0);
        assert_eq!(split["status"]["current_segment"], "B");

        clock.advance(15.0);
        let finished = router.dispatch(&command("split"));
        assert_eq!(finished["action"], "finished");
        assert_eq!(finished["total"], 25.0);
        assert_eq!(finished["saved"], true);
        assert_eq!(finished["status"]["current_index"], -1);
        assert_eq!(finished["status"]["running"], false);
    }

    #[test]
    fn split_after_finish_keeps_the_result() {
        let (router, clock) = router();
        router.dispatch(&command("split"));
        clock.advance(10.0);
        router.dispatch(&command("split"));
        clock.advance(15.0);
        assert_eq!(router.dispatch(&command("split"))["action"], "finished");

        clock.advance(0.1);
        let extra = router.dispatch(&command("split"));
        assert_eq!(extra["action"], "ignored");
        assert_eq!(extra["status"]["running"], false);
        assert_eq!(extra["status"]["elapsed"], 25.0);
        assert_eq!(extra["status"]["split_times"], json!([10.0, 25.0]));

        router.dispatch(&command("reset"));
        assert_eq!(router.dispatch(&command("split"))["action"], "started");
    }

    #[test]
    fn start_twice_is_ignored() {
        let (router, _) = router();
        assert_eq!(router.dispatch(&command("start"))["action"], "started");
        assert_eq!(router.dispatch(&command("start"))["action"], "ignored");
    }

    #[test]
    fn reset_reports_whether_anything_changed() {
        let (router, _) = router();
        assert_eq!(router.dispatch(&command("reset"))["action"], "ignored");

        router.dispatch(&command("start"));
        let reset = router.dispatch(&command("reset"));
        assert_eq!(reset["action"], "reset");
        assert_eq!(reset["status"]["split_times"], json!([]));
    }

    #[test]
    fn status_describes_the_definition() {
        let (router, _) = router();
        let status = router.dispatch(&command("status"));

        assert_eq!(status["action"], "status");
        assert_eq!(status["status"]["game"], "G");
        assert_eq!(status["status"]["segments"], json!(["A", "B"]));
        assert_eq!(status["status"]["current_segment"], Value::Null);
    }

    #[test]
    fn unknown_commands_are_rejected() {
        let (router, _) = router();
        assert_eq!(
            router.dispatch(&command("pause")),
            json!({"response": "error", "error": "unknown_command"})
        );

        let Value::Object(numeric) = json!({ "command": 3 }) else { unreachable!() };
        assert_eq!(router.handle(numeric)["error"], "unknown_command");
    }
}
