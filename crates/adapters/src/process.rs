// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process probing.

/// Pid of the current process.
pub fn current_pid() -> u32 {
    std::process::id()
}

/// Whether `pid` names a live process, probed with the null signal.
///
/// A process owned by another user (`EPERM`) still counts as alive. Pid 0 and
/// values outside the platform pid range are never alive.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Without a null-signal probe only our own pid is known to be alive.
#[cfg(not(unix))]
pub fn is_process_alive(pid: u32) -> bool {
    pid != 0 && pid == current_pid()
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
