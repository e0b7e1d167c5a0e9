//! Typed tracker operations and their by-name parsing.

use crate::error::{Result, SpinnerError};
use crate::tracker::{ProcessSet, ProcessTracker};
use crate::view::ViewBinding;
use serde::{Deserialize, Serialize};

/// A public tracker operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start {
        name: String,
        message: Option<String>,
    },
    Finish {
        name: String,
        #[serde(default)]
        force: bool,
    },
    FinishAll,
    IsRunning {
        name: String,
    },
    IsAnyProcessRunning,
    GetProcesses,
    Destroy,
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Operation has no return value
    Done,
    Running(bool),
    Processes(ProcessSet),
}

impl Command {
    /// Build a command from a method name and positional arguments.
    ///
    /// Method names follow the public API (`start`, `finish`, `finishAll`,
    /// `isRunning`, `isAnyProcessRunning`, `getProcesses`, `destroy`);
    /// snake_case spellings are accepted too. Extra arguments are ignored.
    pub fn from_call(method: &str, args: &[String]) -> Result<Self> {
        if method.starts_with('_') {
            return Err(SpinnerError::PrivateMethod(method.to_string()));
        }

        let name_arg = |index: usize| -> Result<String> {
            args.get(index)
                .cloned()
                .ok_or_else(|| SpinnerError::MissingArgument {
                    method: method.to_string(),
                    argument: "name",
                })
        };

        let command = match method {
            "start" => Command::Start {
                name: name_arg(0)?,
                message: args.get(1).cloned().filter(|m| !m.is_empty()),
            },
            "finish" => Command::Finish {
                name: name_arg(0)?,
                force: match args.get(1) {
                    Some(value) => parse_bool(value)?,
                    None => false,
                },
            },
            "finishAll" | "finish_all" => Command::FinishAll,
            "isRunning" | "is_running" => Command::IsRunning { name: name_arg(0)? },
            "isAnyProcessRunning" | "is_any_process_running" => Command::IsAnyProcessRunning,
            "getProcesses" | "get_processes" => Command::GetProcesses,
            "destroy" => Command::Destroy,
            _ => return Err(SpinnerError::UnknownMethod(method.to_string())),
        };
        Ok(command)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "force" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SpinnerError::InvalidArgument {
            argument: "force",
            value: value.to_string(),
        }),
    }
}

impl<V: ViewBinding> ProcessTracker<V> {
    /// Run a command against this tracker
    pub fn dispatch(&mut self, command: Command) -> Reply {
        match command {
            Command::Start { name, message } => {
                self.start(&name, message.as_deref());
                Reply::Done
            }
            Command::Finish { name, force } => {
                self.finish(&name, force);
                Reply::Done
            }
            Command::FinishAll => {
                self.finish_all();
                Reply::Done
            }
            Command::IsRunning { name } => Reply::Running(self.is_running(&name)),
            Command::IsAnyProcessRunning => Reply::Running(self.is_any_process_running()),
            Command::GetProcesses => Reply::Processes(self.get_processes()),
            Command::Destroy => {
                self.destroy();
                Reply::Done
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpinnerConfig;
    use crate::view::NullView;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_start_with_message() {
        let command = Command::from_call("start", &args(&["download", "Fetching"])).unwrap();
        assert_eq!(
            command,
            Command::Start {
                name: "download".to_string(),
                message: Some("Fetching".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_start_empty_message_is_none() {
        let command = Command::from_call("start", &args(&["job", ""])).unwrap();
        assert_eq!(
            command,
            Command::Start {
                name: "job".to_string(),
                message: None,
            }
        );
    }

    #[test]
    fn test_parse_finish_force() {
        let forced = Command::from_call("finish", &args(&["job", "true"])).unwrap();
        assert_eq!(
            forced,
            Command::Finish {
                name: "job".to_string(),
                force: true,
            }
        );
        let plain = Command::from_call("finish", &args(&["job"])).unwrap();
        assert!(matches!(plain, Command::Finish { force: false, .. }));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Command::from_call("finishAll", &[]).unwrap(), Command::FinishAll);
        assert_eq!(Command::from_call("finish_all", &[]).unwrap(), Command::FinishAll);
        assert_eq!(
            Command::from_call("is_any_process_running", &[]).unwrap(),
            Command::IsAnyProcessRunning
        );
    }

    #[test]
    fn test_reject_private_method() {
        let err = Command::from_call("_refreshView", &[]).unwrap_err();
        assert!(matches!(err, SpinnerError::PrivateMethod(m) if m == "_refreshView"));
    }

    #[test]
    fn test_reject_unknown_method() {
        let err = Command::from_call("bogus", &[]).unwrap_err();
        assert!(matches!(err, SpinnerError::UnknownMethod(m) if m == "bogus"));
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        assert!(matches!(
            Command::from_call("isRunning", &[]),
            Err(SpinnerError::MissingArgument { argument: "name", .. })
        ));
        assert!(matches!(
            Command::from_call("finish", &args(&["job", "maybe"])),
            Err(SpinnerError::InvalidArgument { argument: "force", .. })
        ));
    }

    #[test]
    fn test_dispatch_round() {
        let mut tracker = ProcessTracker::new(SpinnerConfig::default(), NullView);
        let start = Command::from_call("start", &args(&["a", "Working"])).unwrap();
        assert_eq!(tracker.dispatch(start), Reply::Done);
        assert_eq!(
            tracker.dispatch(Command::IsRunning { name: "a".to_string() }),
            Reply::Running(true)
        );

        match tracker.dispatch(Command::GetProcesses) {
            Reply::Processes(set) => assert_eq!(set.messages(), vec!["Working"]),
            other => panic!("unexpected reply {:?}", other),
        }

        tracker.dispatch(Command::FinishAll);
        assert_eq!(
            tracker.dispatch(Command::IsAnyProcessRunning),
            Reply::Running(false)
        );
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&Command::Finish {
            name: "a".to_string(),
            force: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"Finish":{"name":"a","force":true}}"#);

        let parsed: Command = serde_json::from_str(r#"{"Finish":{"name":"a"}}"#).unwrap();
        assert!(matches!(parsed, Command::Finish { force: false, .. }));
    }
}
