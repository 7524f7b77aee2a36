use std::io;

use crate::core::domain::ResourceLimits;

/// Runs in the forked child before exec: new process group, then rlimits.
/// Only async-signal-safe calls belong here.
pub fn apply_in_child(limits: ResourceLimits) -> io::Result<()> {
    if unsafe { libc::setpgid(0, 0) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let rlimit = |value: u64| libc::rlimit {
        rlim_cur: value as libc::rlim_t,
        rlim_max: value as libc::rlim_t,
    };
    if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlimit(0)) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if let Some(bytes) = limits.address_space_bytes {
        if unsafe { libc::setrlimit(libc::RLIMIT_AS, &rlimit(bytes)) } != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    if let Some(seconds) = limits.cpu_seconds {
        // Linux sends SIGXCPU at the soft limit only while it is below the
        // hard one; at the hard limit the child just gets SIGKILL.
        let cpu = cpu_rlimit(seconds);
        if unsafe { libc::setrlimit(libc::RLIMIT_CPU, &cpu) } != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    if let Some(bytes) = limits.file_size_bytes {
        if unsafe { libc::setrlimit(libc::RLIMIT_FSIZE, &rlimit(bytes)) } != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn cpu_rlimit(seconds: u64) -> libc::rlimit {
    libc::rlimit {
        rlim_cur: seconds as libc::rlim_t,
        rlim_max: seconds.saturating_add(1) as libc::rlim_t,
    }
}

/// Sends SIGKILL to every process in the group led by `pgid`.
pub fn kill_group(pgid: i32) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::from(io::ErrorKind::InvalidInput));
    }
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
