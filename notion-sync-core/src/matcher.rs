use crate::contract::Thread;
use crate::signature::carries_signature;

/// First thread whose body starts with `signature`, in iteration order.
///
/// Duplicates (left behind by a double-created thread) are not detected; the
/// earliest one in `threads` wins.
pub fn find_thread<'a>(signature: &str, threads: &'a [Thread]) -> Option<&'a Thread> {
    threads
        .iter()
        .find(|thread| carries_signature(&thread.body, signature))
}
