use crate::hosts::{canonicalize, parse_target};
use crate::types::UniqueList;
use serde::{Deserialize, Serialize};

/// Task solutions starting with this command mark the task as VPN-gated.
pub const VPN_CONNECT_COMMAND: &str = "vpn connect";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTask {
    pub id: String,
    pub title: String,
    /// The command line that completes this task.
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<MissionTask>,
}

fn task_key(mission_id: &str, task_id: &str) -> String {
    format!("{mission_id}/{task_id}")
}

/// Collapse runs of whitespace so `connect   server-01` matches a solution.
pub fn normalize_command(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical host a `connect` solution points at, or `None` for any other
/// kind of task.
fn connect_target(solution: &str) -> Option<String> {
    let solution = normalize_command(solution);
    let target = solution.strip_prefix("connect ")?;
    let target = parse_target(target).ok()?;
    Some(canonicalize(&target.host_ref))
}

#[derive(Debug, Clone, Default)]
pub struct MissionBoard {
    missions: Vec<Mission>,
    completed: UniqueList,
}

impl MissionBoard {
    pub fn new(missions: Vec<Mission>, completed: UniqueList) -> Self {
        Self {
            missions,
            completed,
        }
    }

    /// First mission that still has an incomplete task.
    pub fn current(&self) -> Option<&Mission> {
        self.missions
            .iter()
            .find(|m| m.tasks.iter().any(|t| !self.is_completed(&m.id, &t.id)))
    }

    pub fn is_completed(&self, mission_id: &str, task_id: &str) -> bool {
        self.completed.contains(&task_key(mission_id, task_id))
    }

    pub fn completed(&self) -> &UniqueList {
        &self.completed
    }

    /// Mark the current mission's task solved by `command`, if any.
    /// Returns the completed task's title. Connect tasks never match here;
    /// they complete through `record_connection` once a session exists.
    pub fn record_command(&mut self, command: &str) -> Option<String> {
        let command = normalize_command(command);
        self.complete_first(|t| {
            connect_target(&t.solution).is_none() && normalize_command(&t.solution) == command
        })
    }

    /// Credit the current mission's connect task for `host_id`. Any spelling
    /// of the host in the solution counts.
    pub fn record_connection(&mut self, host_id: &str) -> Option<String> {
        let host_id = canonicalize(host_id);
        self.complete_first(|t| connect_target(&t.solution).as_deref() == Some(host_id.as_str()))
    }

    fn complete_first(&mut self, matches: impl Fn(&MissionTask) -> bool) -> Option<String> {
        let mission = self.current()?;
        let task = mission
            .tasks
            .iter()
            .find(|t| !self.is_completed(&mission.id, &t.id) && matches(t))?;
        let key = task_key(&mission.id, &task.id);
        let title = task.title.clone();
        self.completed.insert(key);
        Some(title)
    }
}
