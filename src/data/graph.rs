//=========================================================================
// Step Graph
//=========================================================================
//
// An activity's instructions as an explicit graph keyed by step id.
//
// Validation (all problems collected, not just the first):
//   - exactly one start: startStepId, else the first instruction
//   - every nextStepId / branch target names an existing step
//   - every step is reachable from the start
//   - from every step some terminal is reachable
//   - no unrecognized actionType
//   - drag steps have an agent and a target; select steps a valid choice
//
// Terminals are `end` steps and any successor written as "end".
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet, VecDeque};

//=== Internal Dependencies ===============================================

use super::model::{ActionType, Instruction, NextStep, ObjectRole, TraditionalActivity};

//=== StepGraph ===========================================================

#[derive(Debug, Clone)]
pub struct StepGraph {
    start: String,
    steps: HashMap<String, Instruction>,
}

impl StepGraph {
    /// Builds and validates the graph of one activity.
    pub fn build(activity: &TraditionalActivity) -> Result<Self, Vec<String>> {
        let mut problems = Vec::new();
        let tag = |msg: String| format!("activity {}: {}", activity.id, msg);

        let Some(first) = activity.instructions.first() else {
            return Err(vec![tag("has no instructions".into())]);
        };

        let mut steps = HashMap::new();
        for instruction in &activity.instructions {
            if steps
                .insert(instruction.id.clone(), instruction.clone())
                .is_some()
            {
                problems.push(tag(format!("duplicate step id {}", instruction.id)));
            }
        }

        let start = activity
            .start_step_id
            .clone()
            .unwrap_or_else(|| first.id.clone());
        if !steps.contains_key(&start) {
            problems.push(tag(format!("start step {} does not exist", start)));
            return Err(problems);
        }

        for instruction in &activity.instructions {
            check_step(instruction, &steps, &mut problems, &tag);
        }

        let graph = Self { start, steps };
        if problems.is_empty() {
            graph.check_reachability(&mut problems, &tag);
        }

        if problems.is_empty() {
            Ok(graph)
        } else {
            Err(problems)
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn step(&self, id: &str) -> Option<&Instruction> {
        self.steps.get(id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    //--- Reachability -----------------------------------------------------

    fn edges<'a>(&'a self, step: &'a Instruction) -> impl Iterator<Item = &'a str> + 'a {
        let terminal = step.action_type == ActionType::End;
        step.successors()
            .filter(move |_| !terminal)
            .filter_map(|next| match next {
                NextStep::Step(id) => Some(id.as_str()),
                NextStep::End => None,
            })
    }

    fn is_terminal(step: &Instruction) -> bool {
        step.action_type == ActionType::End || step.successors().any(|n| *n == NextStep::End)
    }

    fn check_reachability(&self, problems: &mut Vec<String>, tag: &impl Fn(String) -> String) {
        // Forward: everything reachable from start.
        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([self.start.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(step) = self.steps.get(id) {
                queue.extend(self.edges(step));
            }
        }

        let mut unreachable: Vec<&str> = self
            .steps
            .keys()
            .map(String::as_str)
            .filter(|id| !reached.contains(id))
            .collect();
        unreachable.sort_unstable();
        for id in unreachable {
            problems.push(tag(format!("step {} is unreachable from {}", id, self.start)));
        }

        // Backward: steps from which a terminal can be reached.
        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for (id, step) in &self.steps {
            for next in self.edges(step) {
                predecessors.entry(next).or_default().push(id.as_str());
            }
        }
        let mut finishing: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = self
            .steps
            .iter()
            .filter(|(_, step)| Self::is_terminal(step))
            .map(|(id, _)| id.as_str())
            .collect();
        while let Some(id) = queue.pop_front() {
            if !finishing.insert(id) {
                continue;
            }
            if let Some(prev) = predecessors.get(id) {
                queue.extend(prev.iter().copied());
            }
        }

        let mut stuck: Vec<&str> = reached
            .iter()
            .copied()
            .filter(|id| !finishing.contains(id))
            .collect();
        stuck.sort_unstable();
        for id in stuck {
            problems.push(tag(format!("no end is reachable from step {}", id)));
        }
    }
}

//=== Per-step Checks =====================================================

fn check_step(
    step: &Instruction,
    steps: &HashMap<String, Instruction>,
    problems: &mut Vec<String>,
    tag: &impl Fn(String) -> String,
) {
    for next in step.successors() {
        if let NextStep::Step(id) = next {
            if !steps.contains_key(id) {
                problems.push(tag(format!(
                    "step {} points to missing step {}",
                    step.id, id
                )));
            }
        }
    }

    let has_role = |role: ObjectRole| step.objects.iter().any(|o| o.role == role);
    match step.action_type {
        ActionType::Unrecognized => {
            problems.push(tag(format!("step {} has an unrecognized actionType", step.id)));
        }
        ActionType::Drag => {
            if !has_role(ObjectRole::Agent) || !has_role(ObjectRole::Target) {
                problems.push(tag(format!(
                    "drag step {} needs an agent and a target",
                    step.id
                )));
            }
        }
        ActionType::Select => match step.select_target() {
            Some(choice) if step.objects.iter().any(|o| o.id == choice) => {}
            Some(choice) => problems.push(tag(format!(
                "select step {} names missing choice {}",
                step.id, choice
            ))),
            None => problems.push(tag(format!(
                "select step {} has no correct choice",
                step.id
            ))),
        },
        ActionType::Special | ActionType::End => {}
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(steps: serde_json::Value) -> TraditionalActivity {
        serde_json::from_value(serde_json::json!({
            "id": "weaving",
            "biomeId": "river",
            "instructions": steps,
        }))
        .unwrap()
    }

    fn drag(id: &str, next: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id, "text": { "en": id }, "actionType": "drag", "nextStepId": next,
            "objects": [
                { "id": "a", "role": "agent", "position": { "x": 0.2, "y": 0.2 }, "sizePercent": 10 },
                { "id": "t", "role": "target", "position": { "x": 0.8, "y": 0.8 }, "sizePercent": 10 }
            ]
        })
    }

    fn end(id: &str) -> serde_json::Value {
        serde_json::json!({ "id": id, "text": {}, "actionType": "end" })
    }

    #[test]
    fn linear_graph_is_valid() {
        let graph = StepGraph::build(&activity(serde_json::json!([
            drag("step1", "step2"),
            end("step2"),
        ])))
        .unwrap();
        assert_eq!(graph.start(), "step1");
        assert_eq!(graph.len(), 2);
        assert!(graph.step("step2").is_some());
    }

    #[test]
    fn explicit_start_step_wins() {
        let mut a = activity(serde_json::json!([end("done"), drag("begin", "done")]));
        a.start_step_id = Some("begin".into());
        assert_eq!(StepGraph::build(&a).unwrap().start(), "begin");
    }

    #[test]
    fn dangling_target_is_reported() {
        let problems = StepGraph::build(&activity(serde_json::json!([
            drag("step1", "nowhere"),
        ])))
        .unwrap_err();
        assert!(problems[0].contains("missing step nowhere"));
    }

    #[test]
    fn unreachable_and_stuck_steps_are_reported() {
        let problems = StepGraph::build(&activity(serde_json::json!([
            drag("loop1", "loop2"),
            drag("loop2", "loop1"),
            end("orphan"),
        ])))
        .unwrap_err();

        assert!(problems.iter().any(|p| p.contains("orphan is unreachable")));
        assert!(problems.iter().any(|p| p.contains("no end is reachable from step loop1")));
        assert!(problems.iter().any(|p| p.contains("no end is reachable from step loop2")));
    }

    #[test]
    fn next_end_literal_counts_as_terminal() {
        let graph = StepGraph::build(&activity(serde_json::json!([drag("only", "end")])));
        assert!(graph.is_ok());
    }

    #[test]
    fn unrecognized_action_is_rejected() {
        let problems = StepGraph::build(&activity(serde_json::json!([
            { "id": "s", "text": {}, "actionType": "juggle" }
        ])))
        .unwrap_err();
        assert!(problems[0].contains("unrecognized actionType"));
    }

    #[test]
    fn drag_without_target_is_rejected() {
        let problems = StepGraph::build(&activity(serde_json::json!([{
            "id": "s", "text": {}, "actionType": "drag",
            "objects": [ { "id": "a", "role": "agent", "position": { "x": 0.1, "y": 0.1 }, "sizePercent": 5 } ]
        }])))
        .unwrap_err();
        assert!(problems[0].contains("needs an agent and a target"));
    }

    #[test]
    fn empty_activity_is_rejected() {
        assert!(StepGraph::build(&activity(serde_json::json!([]))).is_err());
    }
}
