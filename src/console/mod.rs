//! Operator command console
//!
//! Reads whitespace-delimited command lines from an input stream and
//! dispatches them against the server subsystems: account management
//! (`mkusr`, `rmusr`), online-player inspection (`players`), per-area log
//! retrieval (`getlog`), and server-wide broadcast (`say`).
//!
//! The console is a fire-and-forget action dispatcher: every outcome is
//! reported through the [`OutputSink`], never returned to the caller. One
//! line is fully processed before the next is read, and the loop ends only
//! at end of stream or when a dispatch asks for [`Flow::Shutdown`].
//!
//! All subsystems are reached through the collaborator traits defined here
//! and injected at construction, so the console can run against the live
//! server or against test doubles.

mod output;

pub use output::{MemorySink, OutputSink, TracingSink};

use std::fmt::Display;
use std::future::Future;
use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::area::Area;
use crate::client::Client;
use crate::permissions::{Permissions, RoleError};

/// Persistent user accounts, keyed by name.
pub trait UserStore: Send + Sync {
    type Error: Display + Send;

    fn exists(&self, username: &str) -> impl Future<Output = bool> + Send;

    fn create(
        &self,
        username: &str,
        secret: &str,
        permissions: Permissions,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn remove(&self, username: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Role-name to permission-bitset resolution.
pub trait RoleResolver: Send + Sync {
    fn resolve(&self, role_name: &str) -> Result<Permissions, RoleError>;
}

/// Current and maximum online player counts.
pub trait PlayerRegistry: Send + Sync {
    fn player_count(&self) -> (usize, usize);
}

/// Enumerable collection of the server's areas.
pub trait AreaRegistry: Send + Sync {
    fn areas(&self) -> Vec<Arc<Area>>;
}

/// Enumerable collection of currently connected clients.
pub trait ClientRegistry: Send + Sync {
    fn clients(&self) -> Vec<Arc<Client>>;
}

impl<T: UserStore> UserStore for Arc<T> {
    type Error = T::Error;

    fn exists(&self, username: &str) -> impl Future<Output = bool> + Send {
        (**self).exists(username)
    }

    fn create(
        &self,
        username: &str,
        secret: &str,
        permissions: Permissions,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).create(username, secret, permissions)
    }

    fn remove(&self, username: &str) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).remove(username)
    }
}

impl<T: RoleResolver + ?Sized> RoleResolver for Arc<T> {
    fn resolve(&self, role_name: &str) -> Result<Permissions, RoleError> {
        (**self).resolve(role_name)
    }
}

impl<T: PlayerRegistry + ?Sized> PlayerRegistry for Arc<T> {
    fn player_count(&self) -> (usize, usize) {
        (**self).player_count()
    }
}

impl<T: AreaRegistry + ?Sized> AreaRegistry for Arc<T> {
    fn areas(&self) -> Vec<Arc<Area>> {
        (**self).areas()
    }
}

impl<T: ClientRegistry + ?Sized> ClientRegistry for Arc<T> {
    fn clients(&self) -> Vec<Arc<Client>> {
        (**self).clients()
    }
}

/// One parsed input line. Exists only for the duration of a dispatch.
///
/// The line is split strictly on single spaces, so consecutive spaces
/// produce empty-string arguments and a trailing space produces a trailing
/// empty argument. Arity checks count those tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Command<'a> {
        let mut tokens = line.split(' ');
        // split always yields at least one token, even for an empty line
        let name = tokens.next().unwrap_or("");
        Command {
            name,
            args: tokens.collect(),
        }
    }
}

/// How a command captures its message argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgStyle {
    /// Only the first token after the command name; the rest is discarded.
    SingleToken,
    /// Everything after the command name, rejoined on single spaces.
    RestOfLine,
}

impl ArgStyle {
    fn capture(self, args: &[&str]) -> String {
        match self {
            ArgStyle::SingleToken => args.first().copied().unwrap_or("").to_string(),
            ArgStyle::RestOfLine => args.join(" "),
        }
    }
}

/// What `mkusr` does after reporting that the user already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateUserPolicy {
    /// Terminate the whole listen loop.
    AbortConsole,
    /// Move on to the next input line.
    Continue,
}

/// What `rmusr` does after reporting that the user does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingUserPolicy {
    /// Issue the removal anyway.
    AttemptRemoval,
    /// Skip the removal.
    Skip,
}

/// Tunable console behaviors.
///
/// The defaults reproduce the long-standing behavior of the console:
/// `mkusr` on a duplicate user stops the console, `rmusr` on a missing user
/// still issues the removal, and `say`/`getlog` take only the first token
/// of their argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolePolicy {
    pub on_duplicate_user: DuplicateUserPolicy,
    pub on_missing_user: MissingUserPolicy,
    pub say_args: ArgStyle,
    pub getlog_args: ArgStyle,
}

impl Default for ConsolePolicy {
    fn default() -> ConsolePolicy {
        ConsolePolicy {
            on_duplicate_user: DuplicateUserPolicy::AbortConsole,
            on_missing_user: MissingUserPolicy::AttemptRemoval,
            say_args: ArgStyle::SingleToken,
            getlog_args: ArgStyle::SingleToken,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Help,
    MakeUser,
    RemoveUser,
    Players,
    GetLog,
    Say,
}

/// One entry of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub usage: &'static str,
    pub arg_style: ArgStyle,
    kind: CommandKind,
}

/// The fixed table of recognized commands.
///
/// Built once at console construction and never mutated. Argument styles
/// for the message-bearing commands come from the policy.
#[derive(Debug, Clone)]
pub struct CommandTable {
    specs: [CommandSpec; 6],
}

impl CommandTable {
    pub fn new(policy: &ConsolePolicy) -> CommandTable {
        CommandTable {
            specs: [
                CommandSpec {
                    name: "help",
                    min_args: 0,
                    usage: "help",
                    arg_style: ArgStyle::SingleToken,
                    kind: CommandKind::Help,
                },
                CommandSpec {
                    name: "mkusr",
                    min_args: 3,
                    usage: "mkusr <username> <password> <role>",
                    arg_style: ArgStyle::SingleToken,
                    kind: CommandKind::MakeUser,
                },
                CommandSpec {
                    name: "rmusr",
                    min_args: 1,
                    usage: "rmusr <username>",
                    arg_style: ArgStyle::SingleToken,
                    kind: CommandKind::RemoveUser,
                },
                CommandSpec {
                    name: "players",
                    min_args: 0,
                    usage: "players",
                    arg_style: ArgStyle::SingleToken,
                    kind: CommandKind::Players,
                },
                CommandSpec {
                    name: "getlog",
                    min_args: 1,
                    usage: "getlog <area>",
                    arg_style: policy.getlog_args,
                    kind: CommandKind::GetLog,
                },
                CommandSpec {
                    name: "say",
                    min_args: 1,
                    usage: "say <message>",
                    arg_style: policy.say_args,
                    kind: CommandKind::Say,
                },
            ],
        }
    }

    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Command names in table order, comma-joined for the `help` notice.
    pub fn names(&self) -> String {
        self.specs
            .iter()
            .map(|spec| spec.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcome of one dispatch: keep listening or stop the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// The operator console.
///
/// Holds its collaborators by value; wrap shared subsystems in `Arc` to
/// keep using them elsewhere (the collaborator traits forward through
/// `Arc`).
pub struct Console<U, R, P, A, C, O> {
    users: U,
    roles: R,
    players: P,
    areas: A,
    clients: C,
    out: O,
    policy: ConsolePolicy,
    table: CommandTable,
}

impl<U, R, P, A, C, O> Console<U, R, P, A, C, O>
where
    U: UserStore,
    R: RoleResolver,
    P: PlayerRegistry,
    A: AreaRegistry,
    C: ClientRegistry,
    O: OutputSink,
{
    pub fn new(
        users: U,
        roles: R,
        players: P,
        areas: A,
        clients: C,
        out: O,
        policy: ConsolePolicy,
    ) -> Self {
        let table = CommandTable::new(&policy);
        Console {
            users,
            roles,
            players,
            areas,
            clients,
            out,
            policy,
            table,
        }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Consume `reader` line by line until end of stream, dispatching each
    /// line in order. Returns early if a dispatch requests shutdown.
    pub async fn listen<S: AsyncBufRead + Unpin>(&self, reader: S) -> io::Result<()> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Flow::Shutdown = self.dispatch(&line).await {
                break;
            }
        }
        Ok(())
    }

    /// Parse and execute a single input line.
    pub async fn dispatch(&self, line: &str) -> Flow {
        let cmd = Command::parse(line);

        let Some(spec) = self.table.find(cmd.name) else {
            self.out.info("Unrecognized command");
            return Flow::Continue;
        };

        if cmd.args.len() < spec.min_args {
            self.out.info_fmt(format_args!(
                "Not enough arguments for command {}. Usage: {}.",
                spec.name, spec.usage
            ));
            return Flow::Continue;
        }

        match spec.kind {
            CommandKind::Help => self.cmd_help(),
            CommandKind::MakeUser => return self.cmd_mkusr(&cmd.args).await,
            CommandKind::RemoveUser => self.cmd_rmusr(&cmd.args).await,
            CommandKind::Players => self.cmd_players(),
            CommandKind::GetLog => self.cmd_getlog(&spec.arg_style.capture(&cmd.args)),
            CommandKind::Say => self.cmd_say(&spec.arg_style.capture(&cmd.args)),
        }
        Flow::Continue
    }

    fn cmd_help(&self) {
        self.out
            .info_fmt(format_args!("Recognized commands: {}.", self.table.names()));
    }

    async fn cmd_mkusr(&self, args: &[&str]) -> Flow {
        let (user, secret, role_name) = (args[0], args[1], args[2]);

        if self.users.exists(user).await {
            self.out.info("User already exists.");
            return match self.policy.on_duplicate_user {
                DuplicateUserPolicy::AbortConsole => Flow::Shutdown,
                DuplicateUserPolicy::Continue => Flow::Continue,
            };
        }

        let permissions = match self.roles.resolve(role_name) {
            Ok(p) => p,
            Err(_) => {
                self.out.info("Invalid role.");
                return Flow::Continue;
            }
        };

        match self.users.create(user, secret, permissions).await {
            Ok(()) => self
                .out
                .info_fmt(format_args!("Successfully created user {user}.")),
            Err(e) => self
                .out
                .info_fmt(format_args!("Failed to create user: {e}.")),
        }
        Flow::Continue
    }

    async fn cmd_rmusr(&self, args: &[&str]) {
        let user = args[0];

        if !self.users.exists(user).await {
            self.out.info("User does not exist.");
            if let MissingUserPolicy::Skip = self.policy.on_missing_user {
                return;
            }
        }

        match self.users.remove(user).await {
            Ok(()) => self
                .out
                .info_fmt(format_args!("Successfully removed user {user}.")),
            Err(e) => self
                .out
                .info_fmt(format_args!("Failed to remove user: {e}.")),
        }
    }

    fn cmd_players(&self) {
        let (online, max) = self.players.player_count();
        self.out.info_fmt(format_args!(
            "There are currently {online}/{max} players online."
        ));
    }

    fn cmd_getlog(&self, area_name: &str) {
        // First name match wins; no match produces no output.
        if let Some(area) = self
            .areas
            .areas()
            .into_iter()
            .find(|a| a.name() == area_name)
        {
            self.out.info(&area.log_buffer().join("\n"));
        }
    }

    fn cmd_say(&self, message: &str) {
        for client in self.clients.clients() {
            client.send_server_message(message);
        }
    }
}
