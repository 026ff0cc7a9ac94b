#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "profile",
        action: "set_profile",
    },
    CommandSpec {
        command: "model",
        action: "set_model",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "open",
        action: "select_image",
    },
    CommandSpec {
        command: "save",
        action: "save_result",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "analyze",
        action: "start_analysis",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
    },
    CommandSpec {
        command: "connect",
        action: "connect",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "views",
        action: "views",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const SESSION_HELP_COMMANDS: &[&str] = &[
    "/open <path>",
    "/analyze",
    "/reset",
    "/connect",
    "/status",
    "/views",
    "/save [path]",
    "/profile <name>",
    "/model <id>",
    "/help",
    "/quit",
];
