use std::process::{Command, Stdio};

use tracing::{debug, error, warn};

/// Seam for command execution, so the dispatcher can run under test without
/// launching real processes.
pub trait Spawner {
    fn spawn(&mut self, argv: &[String]);
}

/// The production spawner: launch-and-forget through [`spawn_command`].
#[derive(Debug, Default)]
pub struct CommandSpawner;

impl Spawner for CommandSpawner {
    fn spawn(&mut self, argv: &[String]) {
        spawn_command(argv);
    }
}

/// Launches an external command and forgets about it: no waiting, no output
/// capture. A launch failure is logged and swallowed so a bad binding can
/// never take down the event loop.
pub fn spawn_command(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        warn!("ignoring binding with an empty command");
        return;
    };

    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => debug!(command = %program, pid = child.id(), "spawned"),
        Err(err) => error!(command = %program, error = %err, "failed to spawn command"),
    }
}
