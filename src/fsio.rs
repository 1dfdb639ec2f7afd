//! Filesystem primitives with bounded retry.
//!
//! The compiler needs exactly three capabilities: read a file to a string,
//! ensure a directory exists, write a string to a path. Transient failures
//! (interrupted syscalls, resource-temporarily-busy) are retried with
//! exponential backoff; permanent failures (not-found, permission) surface
//! immediately. Whatever still escapes is fatal to the current run.

use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 4;
const BASE_DELAY: Duration = Duration::from_millis(20);

fn is_transient(err: &io::Error) -> bool {
    use io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::ResourceBusy | ErrorKind::TimedOut
    )
}

fn with_retry<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut delay = BASE_DELAY;
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn read_to_string(path: &Path) -> io::Result<String> {
    with_retry(|| std::fs::read_to_string(path))
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    with_retry(|| std::fs::create_dir_all(path))
}

pub fn write(path: &Path, contents: &str) -> io::Result<()> {
    with_retry(|| std::fs::write(path, contents))
}
